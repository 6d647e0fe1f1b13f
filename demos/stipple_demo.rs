//! Example: Stipple a synthetic radial gradient
//!
//! Demonstrates the basic usage of the stippling pipeline.

use voronoi_stipple::*;

fn radial_gradient(width: usize, height: usize) -> Vec<u8> {
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let max_r = (cx * cx + cy * cy).sqrt();

    let mut rgba = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let r = ((x as f64 + 0.5 - cx).powi(2) + (y as f64 + 0.5 - cy).powi(2)).sqrt();
            let v = (255.0 * r / max_r).min(255.0) as u8;
            rgba.extend_from_slice(&[v, v, v, 255]);
        }
    }
    rgba
}

fn main() -> Result<()> {
    println!("Voronoi Stippling Example");
    println!("=========================\n");

    let (width, height) = (200, 150);
    let field = DarknessField::from_rgba(width, height, &radial_gradient(width, height))?;

    let config = StippleConfigBuilder::new()
        .seed(42)
        .iterations(40)?
        .build()?;

    println!("Configuration:");
    println!("  Seed: {}", config.seed);
    println!("  Field: {}x{}", width, height);
    println!("  Sites: {}", config.point_count_for(width, height));
    println!("  Passes: {}", config.iterations);
    println!();

    println!("Relaxing...");
    let mut engine = StippleEngine::initialize(config, &field)?;
    for k in 0..config.iterations {
        let stats = engine.relax(k);
        if k % 10 == 0 || k + 1 == config.iterations {
            println!(
                "  Pass {:>3}: max displacement {:.3}, empty cells {}",
                k, stats.max_displacement, stats.empty_cells
            );
        }
    }
    let info = engine.info();
    println!();

    // Dots should crowd toward the dark center
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let inner = info
        .positions()
        .filter(|p| (p.x - cx).abs() < width as f64 / 4.0 && (p.y - cy).abs() < height as f64 / 4.0)
        .count();

    println!("Statistics:");
    println!("  Dots: {}", info.len());
    println!(
        "  In central quarter of the area: {} ({:.1}%)",
        inner,
        100.0 * inner as f64 / info.len() as f64
    );
    println!();

    println!("Sample dots:");
    for (i, p) in info.positions().take(5).enumerate() {
        println!("  Dot {}: ({:.2}, {:.2})", i, p.x, p.y);
    }

    println!("\nStippling complete!");
    Ok(())
}
