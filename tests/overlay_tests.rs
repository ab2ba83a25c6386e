mod common;

use common::fixtures::plain_page;
use common::{TestResult, ms, texts};
use secnum::{ApplyStrategy, HostDom, MemoryDom, NodeId, NumberingConfig, NumberingEngine};

fn overlay() -> NumberingConfig {
    NumberingConfig {
        strategy: ApplyStrategy::OverlayMarker,
        ..NumberingConfig::default()
    }
}

fn markers(dom: &MemoryDom) -> usize {
    let selector = secnum::parse_selector(".secnum-marker").map(|s| dom.query_all(None, &s));
    match selector {
        Ok(Ok(found)) => found.len(),
        _ => 0,
    }
}

fn insert_heading(dom: &mut MemoryDom, tag: &str, text: &str, before: NodeId) -> NodeId {
    let body = dom.body_id();
    let heading = dom.create_element(tag);
    dom.append_text(heading, text);
    dom.insert_before(body, heading, Some(before));
    heading
}

#[test]
fn test_overlay_numbers_without_touching_text() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let (dom, headings) = plain_page(&[(1, "A"), (2, "B"), (1, "C")]);
    let mut engine = NumberingEngine::new(dom, overlay())?;

    let report = engine.apply_once();
    assert_eq!(report.written, 3);
    assert_eq!(markers(engine.dom()), 3);
    assert_eq!(
        texts(engine.dom(), &headings),
        vec!["1. A", "1.1. B", "2. C"]
    );
    assert_eq!(
        engine.dom().attribute(&headings[1], "data-secnum-done").as_deref(),
        Some("1.1.")
    );
    // No edit signals: the host never sees a content change.
    assert!(engine.dom().signals().is_empty());

    let again = engine.apply_once();
    assert_eq!(again.written, 0);
    assert_eq!(again.unchanged, 3);
    assert_eq!(markers(engine.dom()), 3);
    Ok(())
}

#[test]
fn test_overlay_markers_follow_inserted_heading() -> TestResult {
    let (dom, headings) = plain_page(&[(1, "A"), (1, "C")]);
    let mut engine = NumberingEngine::new(dom, overlay())?;
    engine.apply_once();

    let b = insert_heading(engine.dom_mut(), "h1", "B", headings[1]);
    let report = engine.apply_once();
    assert_eq!(report.written, 2);
    assert_eq!(report.unchanged, 1);
    assert_eq!(markers(engine.dom()), 3);
    assert_eq!(
        texts(engine.dom(), &[headings[0], b, headings[1]]),
        vec!["1. A", "2. B", "3. C"]
    );
    Ok(())
}

#[test]
fn test_overlay_remove_is_exact() -> TestResult {
    let (mut dom, headings) = plain_page(&[(1, "A"), (2, "B")]);
    let body = dom.body_id();
    dom.append_element(body, "style", &[("id", "notion-auto-numbering-style")]);
    let mut engine = NumberingEngine::new(dom, overlay())?;
    engine.apply_once();

    assert_eq!(engine.remove_once(), 2);
    assert_eq!(markers(engine.dom()), 0);
    assert_eq!(texts(engine.dom(), &headings), vec!["A", "B"]);
    for heading in &headings {
        assert_eq!(engine.dom().attribute(heading, "data-secnum-done"), None);
    }
    let legacy = secnum::parse_selector("#notion-auto-numbering-style")?;
    assert!(engine.dom().query_all(None, &legacy)?.is_empty());

    assert_eq!(engine.remove_once(), 0);
    Ok(())
}

#[test]
fn test_exclude_processed_skips_numbered_headings() -> TestResult {
    let (dom, headings) = plain_page(&[(1, "A"), (1, "B")]);
    let config = NumberingConfig {
        exclude_processed: true,
        ..overlay()
    };
    let mut engine = NumberingEngine::new(dom, config)?;

    assert_eq!(engine.apply_once().collected, 2);
    let again = engine.apply_once();
    assert_eq!(again.collected, 0);
    assert_eq!(again.written, 0);
    assert_eq!(texts(engine.dom(), &headings), vec!["1. A", "2. B"]);
    Ok(())
}

#[test]
fn test_overlay_markers_do_not_retrigger_watcher() -> TestResult {
    let (dom, headings) = plain_page(&[(1, "A")]);
    let mut engine = NumberingEngine::new(dom, overlay())?;
    engine.initialize_with(true);
    assert_eq!(texts(engine.dom(), &headings), vec!["1. A"]);

    let body = engine.dom().body_id();
    let h2 = engine.dom_mut().append_element(body, "h2", &[]);
    engine.dom_mut().append_text(h2, "B");
    assert!(engine.pump(ms(0)).is_some());

    let report = engine.tick(ms(500)).ok_or("pass did not run")?;
    assert_eq!(report.written, 1);
    assert_eq!(engine.dom().text_content(&h2), "1.1. B");
    assert_eq!(engine.pump(ms(600)), None);
    assert_eq!(engine.next_deadline(), None);
    Ok(())
}

#[test]
fn test_emptied_heading_loses_its_marker() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let (dom, headings) = plain_page(&[(1, "A"), (1, "B")]);
    let (a, b) = (headings[0], headings[1]);
    let mut engine = NumberingEngine::new(dom, overlay())?;
    engine.apply_once();
    assert_eq!(texts(engine.dom(), &headings), vec!["1. A", "2. B"]);

    // The marker is the first child, the title text the second.
    let title = engine.dom().children(a)[1];
    engine.dom_mut().set_text(title, "");

    let report = engine.apply_once();
    assert_eq!(report.collected, 2);
    assert_eq!(report.skipped_empty, 1);
    assert_eq!(report.numbered, 1);
    assert_eq!(report.written, 2);
    assert_eq!(texts(engine.dom(), &headings), vec!["", "1. B"]);
    assert_eq!(engine.dom().attribute(&a, "data-secnum-done"), None);
    assert_eq!(
        engine.dom().attribute(&b, "data-secnum-done").as_deref(),
        Some("1.")
    );
    assert_eq!(markers(engine.dom()), 1);

    let again = engine.apply_once();
    assert_eq!(again.written, 0);
    Ok(())
}

#[test]
fn test_unresolved_heading_loses_its_marker() -> TestResult {
    let mut dom = MemoryDom::new();
    let body = dom.body_id();
    let styled = dom.append_element(body, "div", &[("role", "heading")]);
    dom.set_font_size(styled, 48.0);
    dom.append_text(styled, "Styled");
    let h1 = dom.append_element(body, "h1", &[]);
    dom.append_text(h1, "Plain");

    let mut engine = NumberingEngine::new(dom, overlay())?;
    engine.apply_once();
    assert_eq!(texts(engine.dom(), &[styled, h1]), vec!["1. Styled", "2. Plain"]);

    // Shrunk below every threshold: no level signal is left.
    engine.dom_mut().set_font_size(styled, 12.0);
    let report = engine.apply_once();
    assert_eq!(report.numbered, 1);
    assert_eq!(report.written, 2);
    assert_eq!(texts(engine.dom(), &[styled, h1]), vec!["Styled", "1. Plain"]);
    assert_eq!(engine.dom().attribute(&styled, "data-secnum-done"), None);
    Ok(())
}
