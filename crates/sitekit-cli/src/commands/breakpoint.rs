use anyhow::{bail, Result};

use sitekit_ui::viewport::{is_desktop_width, is_mobile_width, is_tablet_width};
use sitekit_ui::Breakpoint;

pub fn run(width: f64) -> Result<()> {
    if !width.is_finite() || width < 0.0 {
        bail!("Width must be a non-negative number, got {}", width);
    }

    let breakpoint = Breakpoint::from_width(width);
    println!("{}px -> {}", width, breakpoint);

    let mut ranges = Vec::new();
    if is_mobile_width(width) {
        ranges.push("mobile");
    }
    if is_tablet_width(width) {
        ranges.push("tablet");
    }
    if is_desktop_width(width) {
        ranges.push("desktop");
    }
    if !ranges.is_empty() {
        println!("  {}", ranges.join(", "));
    }

    Ok(())
}
