use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use tracing::{debug, info};

use sitekit_core::{PageFixture, SiteConfig};
use sitekit_ui::Site;

use crate::script::{Script, Step};

pub async fn run(
    config: Arc<SiteConfig>,
    page: &Path,
    script: &Path,
    json: bool,
    realtime: bool,
) -> Result<()> {
    let fixture = PageFixture::from_path(page)
        .with_context(|| format!("Failed to load page fixture {}", page.display()))?;
    let script = Script::from_path(script)?;

    let site = replay(config, &fixture, &script, realtime).await?;
    print_report(&site, json)
}

/// Boot a site on the fixture and play every step in order
pub async fn replay(
    config: Arc<SiteConfig>,
    fixture: &PageFixture,
    script: &Script,
    realtime: bool,
) -> Result<Site> {
    let dom = fixture.build()?;
    let mut site = Site::boot(Box::new(dom), config);
    info!(steps = script.steps.len(), "Replaying session");

    for (index, step) in script.steps.iter().enumerate() {
        debug!(index, ?step, "Step");
        if let Step::Wait { ms } = step {
            if realtime {
                tokio::time::sleep(Duration::from_millis(ms.max(0.0) as u64)).await;
            }
            site.advance(*ms);
            continue;
        }

        let dom = site
            .headless_mut()
            .ok_or_else(|| anyhow!("Replay requires a headless document"))?;
        let event = step
            .to_event(dom)
            .with_context(|| format!("Step {} failed", index + 1))?;
        if let Some(event) = event {
            site.handle(event);
        }
        let now = site.now();
        site.tick(now);
    }

    Ok(site)
}

fn print_report(site: &Site, json: bool) -> Result<()> {
    let notifications = site.page().bus.history();
    let snapshot = site.snapshot();

    if json {
        let report = json!({
            "notifications": notifications,
            "snapshot": snapshot,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if notifications.is_empty() {
        println!("No notifications.");
    } else {
        println!("Notifications ({}):\n", notifications.len());
        for notification in notifications {
            println!(
                "  [{:>7.0} ms] {} {}",
                notification.at_ms, notification.name, notification.detail
            );
        }
    }

    println!("\nFinal state:");
    println!("  Breakpoint:      {}", snapshot.breakpoint);
    println!("  Menu open:       {}", snapshot.menu_open);
    println!("  Current section: {}", snapshot.current_section);
    println!("  Animated:        {}", snapshot.animated);
    println!("  Scroll Y:        {}", snapshot.scroll_y);
    println!("  Pending timers:  {}", snapshot.pending_timers);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitekit_core::notify::{MOBILE_MENU_CLOSED, MOBILE_MENU_OPENED};

    const FIXTURE: &str = r##"
        [viewport]
        width = 375
        height = 700

        [[element]]
        tag = "header"
        rect = [0, 0, 375, 60]

        [[element.child]]
        tag = "button"
        id = "mobileMenuBtn"
        rect = [320, 10, 40, 40]

        [[element.child]]
        tag = "nav"
        id = "mainNav"
        rect = [0, 60, 375, 300]

        [[element.child.child]]
        tag = "a"
        attrs = { href = "#about" }
        rect = [0, 60, 375, 40]

        [[element]]
        tag = "section"
        id = "home"
        rect = [0, 0, 375, 900]

        [[element]]
        tag = "section"
        id = "about"
        rect = [0, 900, 375, 1200]
    "##;

    async fn play(script: &str) -> Result<Site> {
        let fixture = PageFixture::from_toml_str(FIXTURE)?;
        let script = Script::from_toml_str(script)?;
        replay(Arc::new(SiteConfig::default()), &fixture, &script, false).await
    }

    #[tokio::test]
    async fn test_menu_session() {
        let site = play(
            r##"
            [[step]]
            action = "ready"

            [[step]]
            action = "click"
            selector = "#mobileMenuBtn"

            [[step]]
            action = "key"
            key = "Escape"
            "##,
        )
        .await
        .unwrap();

        let names: Vec<_> = site.page().bus.history().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec![MOBILE_MENU_OPENED, MOBILE_MENU_CLOSED]);
        assert!(!site.snapshot().menu_open);
    }

    #[tokio::test]
    async fn test_link_session_scrolls_after_close() {
        let site = play(
            r##"
            [[step]]
            action = "ready"

            [[step]]
            action = "click"
            selector = "#mobileMenuBtn"

            [[step]]
            action = "click"
            selector = "#mainNav a"

            [[step]]
            action = "wait"
            ms = 1200
            "##,
        )
        .await
        .unwrap();

        let snapshot = site.snapshot();
        assert!(!snapshot.menu_open);
        assert_eq!(snapshot.scroll_y, 900.0 - 60.0 - 80.0);
    }

    #[tokio::test]
    async fn test_unmatched_selector_fails_the_replay() {
        let err = play(
            r##"
            [[step]]
            action = "click"
            selector = ".missing"
            "##,
        )
        .await
        .unwrap_err();
        assert!(format!("{:#}", err).contains(".missing"));
    }
}
