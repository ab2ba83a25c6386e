mod common;

use common::fixtures::{NotionPage, plain_page};
use common::{TestResult, texts};
use secnum::{
    ConfigError, HostDom, NumberingConfig, NumberingEngine, NumberingError, engine_from_json,
};

#[test]
fn test_notion_blocks_are_numbered_by_container_class() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let page = NotionPage::with_headings(&[
        (1, "Overview"),
        (2, "Goals"),
        (3, "Metrics"),
        (1, "Design"),
    ]);
    let headings = page.headings.clone();
    let mut engine = NumberingEngine::new(page.dom, NumberingConfig::notion())?;

    let report = engine.initialize_with(true).ok_or("no pass ran")?;
    assert_eq!(report.collected, 4);
    assert_eq!(report.written, 4);
    assert_eq!(
        texts(engine.dom(), &headings),
        vec!["1. Overview", "1.1. Goals", "1.1.1. Metrics", "2. Design"]
    );
    Ok(())
}

#[test]
fn test_orphans_are_back_filled() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let (dom, headings) = plain_page(&[
        (1, "A"),
        (2, "B"),
        (2, "C"),
        (1, "D"),
        (3, "E"),
        (3, "F"),
        (2, "G"),
    ]);
    let mut engine = NumberingEngine::new(dom, NumberingConfig::default())?;
    engine.apply_once();

    assert_eq!(
        texts(engine.dom(), &headings),
        vec![
            "1. A", "1.1. B", "1.2. C", "2. D", "2.1.1. E", "2.1.2. F", "2.2. G"
        ]
    );
    Ok(())
}

#[test]
fn test_lone_deep_heading() -> TestResult {
    let (dom, headings) = plain_page(&[(3, "Only")]);
    let mut engine = NumberingEngine::new(dom, NumberingConfig::default())?;
    engine.apply_once();
    assert_eq!(texts(engine.dom(), &headings), vec!["1.1.1. Only"]);
    Ok(())
}

#[test]
fn test_second_pass_is_a_no_op() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let page = NotionPage::with_headings(&[(1, "A"), (2, "B"), (1, "C"), (2, "D")]);
    let mut engine = NumberingEngine::new(page.dom, NumberingConfig::notion())?;
    let first = engine.apply_once();
    assert_eq!(first.written, 4);
    assert_eq!(engine.dom().signals().len(), 16);

    engine.dom_mut().clear_signals();
    let second = engine.apply_once();
    assert_eq!(second.written, 0);
    assert_eq!(second.unchanged, 4);
    assert!(engine.dom().signals().is_empty());
    Ok(())
}

#[test]
fn test_stale_numbers_are_corrected() -> TestResult {
    let (dom, headings) = plain_page(&[(1, "3. Intro"), (2, "1.1. Scope"), (1, "Usage")]);
    let mut engine = NumberingEngine::new(dom, NumberingConfig::default())?;

    let report = engine.apply_once();
    assert_eq!(report.written, 2);
    assert_eq!(report.unchanged, 1);
    assert_eq!(
        texts(engine.dom(), &headings),
        vec!["1. Intro", "1.1. Scope", "2. Usage"]
    );
    Ok(())
}

#[test]
fn test_numbers_follow_document_order_after_insert() -> TestResult {
    let mut page = NotionPage::with_headings(&[(1, "A"), (1, "C")]);
    let c = page.headings[1];
    let b = page.heading_before(1, "B", c);
    let a = page.headings[0];
    let mut engine = NumberingEngine::new(page.dom, NumberingConfig::notion())?;

    engine.apply_once();
    assert_eq!(texts(engine.dom(), &[a, b, c]), vec!["1. A", "2. B", "3. C"]);
    Ok(())
}

#[test]
fn test_prefix_like_titles_are_not_mistaken() -> TestResult {
    let (dom, headings) = plain_page(&[(1, "2024 Roadmap"), (1, "3.5 kg")]);
    let mut engine = NumberingEngine::new(dom, NumberingConfig::default())?;
    engine.apply_once();
    assert_eq!(
        texts(engine.dom(), &headings),
        vec!["1. 2024 Roadmap", "2. 3.5 kg"]
    );
    Ok(())
}

#[test]
fn test_engine_from_json_configuration() -> TestResult {
    let (dom, headings) = plain_page(&[(1, "A"), (4, "B")]);
    let mut engine = engine_from_json(dom, r#"{ "maxLevel": 3 }"#)?;
    let report = engine.apply_once();

    // h4 is beyond maxLevel and has no other level signal.
    assert_eq!(report.numbered, 1);
    assert_eq!(texts(engine.dom(), &headings), vec!["1. A", "B"]);
    assert!(engine_from_json(engine.into_dom(), r#"{ "maxLevel": 9 }"#).is_err());
    Ok(())
}

#[test]
fn test_invalid_selector_is_rejected() {
    let (dom, _) = plain_page(&[]);
    let config = NumberingConfig {
        heading_selectors: vec!["h1 >> h2".to_string()],
        ..NumberingConfig::default()
    };
    assert!(matches!(
        NumberingEngine::new(dom, config),
        Err(NumberingError::Config(ConfigError::Selector(_)))
    ));
}

#[test]
fn test_structure_report_describes_page() -> TestResult {
    let mut page = NotionPage::with_headings(&[(1, "A"), (2, "B")]);
    page.paragraph("Body");
    let engine = NumberingEngine::new(page.dom, NumberingConfig::notion())?;

    let report = engine.structure_report();
    assert_eq!(report.container.as_deref(), Some(".notion-page-content"));
    assert!(
        report
            .heading_class_names
            .contains(&"notion-sub_header-block".to_string())
    );
    assert_eq!(engine.dom().tag_name(&engine.dom().body_id()).as_deref(), Some("body"));
    Ok(())
}

#[test]
fn test_emptied_heading_drops_its_bare_number() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let (dom, headings) = plain_page(&[(1, "A"), (1, "B"), (4, "3. Notes")]);
    let config = NumberingConfig {
        max_level: 3,
        ..NumberingConfig::default()
    };
    let mut engine = NumberingEngine::new(dom, config)?;
    engine.apply_once();
    assert_eq!(texts(engine.dom(), &headings), vec!["1. A", "2. B", "3. Notes"]);

    // The user deletes the title and leaves the number behind.
    let title = engine.dom().children(headings[0])[0];
    engine.dom_mut().set_text(title, "1. ");
    engine.dom_mut().clear_signals();

    let report = engine.apply_once();
    assert_eq!(report.skipped_empty, 1);
    assert_eq!(report.written, 2);
    // Text on an unresolved heading may be the user's own, so it stays.
    assert_eq!(texts(engine.dom(), &headings), vec!["", "1. B", "3. Notes"]);
    assert_eq!(engine.dom().signals().len(), 8);

    assert_eq!(engine.apply_once().written, 0);
    Ok(())
}

#[test]
fn test_failing_query_does_not_hide_other_headings() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let (mut dom, mut headings) = plain_page(&[(1, "Tagged")]);
    let body = dom.body_id();
    let aria = dom.append_element(body, "div", &[("role", "heading")]);
    dom.set_font_size(aria, 48.0);
    dom.append_text(aria, "Aria");
    headings.push(aria);
    dom.fail_query("h1, h2, h3, h4, h5, h6");

    let mut engine = NumberingEngine::new(dom, NumberingConfig::default())?;
    let report = engine.apply_once();
    assert_eq!(report.collected, 1);
    assert_eq!(report.written, 1);
    assert_eq!(texts(engine.dom(), &headings), vec!["Tagged", "1. Aria"]);
    Ok(())
}
