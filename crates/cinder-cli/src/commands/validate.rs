//! Scene validation command

use anyhow::Result;

use crate::scene::{load_scene, Scene};

pub fn run(scene_path: &str) -> Result<()> {
    let scene = load_scene(scene_path)?;
    let lines = report(&scene);

    println!("Scene: {}", scene_path);
    for line in &lines {
        println!("  {}", line);
    }
    Ok(())
}

/// Human-readable summary of the scene and any values that will be replaced
fn report(scene: &Scene) -> Vec<String> {
    let mut lines = vec![
        format!("Capacity: {}", scene.system.max_particles),
        format!("Spawners: {}", scene.spawners.len()),
        format!(
            "Terrain:  {}",
            match &scene.terrain {
                Some(t) if t.heightmap_path.is_empty() => format!("flat at {}", t.flat_height),
                Some(t) => t.heightmap_path.clone(),
                None => "none".to_string(),
            }
        ),
    ];

    if scene.spawners.is_empty() {
        lines.push("Warning: no spawners, the system will stay empty".to_string());
    }

    let issues = scene.validate();
    if issues.is_empty() {
        lines.push("All settings valid.".to_string());
    } else {
        lines.push(format!("{} setting(s) will be replaced by defaults:", issues.len()));
        lines.extend(issues.iter().map(|e| format!("  - {}", e)));
    }
    lines
}
