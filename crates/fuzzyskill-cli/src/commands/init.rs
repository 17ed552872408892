//! The `fuzzyskill init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("fuzzyskill.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("datasets").context("failed to create datasets/")?;
    write_if_missing(Path::new("datasets/example.toml"), EXAMPLE_DATASET)?;

    println!("\nNext steps:");
    println!("  1. Edit fuzzyskill.toml to pick a defuzzifier and skill scale");
    println!("  2. Run: fuzzyskill validate --dataset datasets/example.toml");
    println!("  3. Run: fuzzyskill assess --dataset datasets/example.toml");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# fuzzyskill configuration

# COA, COM, MOM, CMCOA, CMCOM or CMMOM
defuzzifier = "COM"
# How a rule's firing strength reduces its conclusion: scale or clip
shrink = "clip"
# How per-class metric memberships are learned: gaussian or non-parametric
metric_membership = "gaussian"

skill_classes = 2
min_skill = 0.0
max_skill = 1.0
number_of_steps = 1000
explanation_rules = 3
"#;

const EXAMPLE_DATASET: &str = r#"[dataset]
id = "example"
name = "Example Dataset"
description = "Two metrics recorded on a simulated task"

[[metrics]]
name = "accuracy"
description = "Fraction of targets hit"
weight = 1.0

[[metrics]]
name = "smoothness"
description = "Inverse jerk of the tool path, normalized"
weight = 0.5

[[training]]
id = "novice-1"
skill = 0.0
values = [0.20, 0.30]

[[training]]
id = "novice-2"
skill = 0.0
values = [0.30, 0.25]

[[training]]
id = "novice-3"
skill = 0.1
values = [0.25, 0.40]

[[training]]
id = "expert-1"
skill = 1.0
values = [0.85, 0.80]

[[training]]
id = "expert-2"
skill = 1.0
values = [0.90, 0.70]

[[training]]
id = "expert-3"
skill = 0.9
values = [0.80, 0.75]

[[tests]]
id = "trainee-a"
values = [0.85, 0.75]

[[tests]]
id = "trainee-b"
values = [0.30, 0.30]

[[tests]]
id = "trainee-c"
values = [0.55, 0.50]
"#;
