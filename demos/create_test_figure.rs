use image::{Rgb, RgbImage};

/// Draw a hexagon-ish ring of bonds as a crude stand-in for a structure
fn draw_ring(img: &mut RgbImage, cx: i32, cy: i32, radius: i32) {
    let black = Rgb([0u8, 0u8, 0u8]);
    for step in 0..720 {
        let angle = step as f64 * std::f64::consts::PI / 360.0;
        for thickness in 0..3 {
            let r = (radius - thickness) as f64;
            let x = cx + (r * angle.cos()).round() as i32;
            let y = cy + (r * angle.sin()).round() as i32;
            if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
                img.put_pixel(x as u32, y as u32, black);
            }
        }
    }
    // Substituent bond sticking out to the right
    for x in cx + radius..cx + radius + 25 {
        for y in cy - 1..=cy + 1 {
            img.put_pixel(x as u32, y as u32, black);
        }
    }
}

/// Blocky glyphs standing in for label characters
fn draw_label(img: &mut RgbImage, left: u32, top: u32, glyphs: u32) {
    for g in 0..glyphs {
        let x0 = left + g * 9;
        for y in top..top + 12 {
            for x in x0..x0 + 6 {
                img.put_pixel(x, y, Rgb([0u8, 0u8, 0u8]));
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let mut img = RgbImage::from_pixel(640, 360, Rgb([255u8, 255u8, 255u8]));

    for (i, cx) in [110, 320, 530].into_iter().enumerate() {
        draw_ring(&mut img, cx, 130, 55);
        draw_label(&mut img, cx as u32 - 20, 225, 3 + i as u32);
    }

    img.save("test_figure.png")?;
    println!("Created test_figure.png (640x360, three diagrams with labels)");
    Ok(())
}
