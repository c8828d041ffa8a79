//! Subcommand implementations.
//!
//! Each handler loads the page snapshot, runs the library and returns the
//! text to print, so `main` only deals with process plumbing.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use rulepick::rule::{describe_node_with, resource_url};
use rulepick::{
    build_rule, selector_from_rule_text, DomTree, MockDom, NodeId, PickerConfig, PickerEvent,
    PickerSession, RuleOptions, ScopeController,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::commands::{DescribeArgs, OutputFormat, RuleArgs, ScopeArgs, SelectorArgs, TargetArgs};
use crate::error::{CliError, CliResult};

fn load_target(target: &TargetArgs) -> CliResult<(MockDom, NodeId)> {
    let dom = MockDom::load(&target.document)?;
    let node = dom.find(&target.node)?;
    debug!(
        document = %target.document.display(),
        node = %target.node,
        tag = %dom.tag_name(&node),
        "target resolved"
    );
    Ok((dom, node))
}

/// `rulepick rule`
pub fn rule(config: &PickerConfig, args: &RuleArgs) -> CliResult<String> {
    let (dom, node) = load_target(&args.target)?;
    let mut options = RuleOptions::new(dom.location())
        .with_rule_type(args.rule_type.into())
        .with_selector_type(args.selector.into())
        .with_one_domain(args.one_domain)
        .with_exclude_tag_name(args.exclude_tag)
        .with_exclude_id(args.exclude_id);
    if let Some(classes) = &args.classes {
        options = options.with_classes(classes.iter().map(String::as_str));
    }
    if let Some(attributes) = &args.attributes {
        options = options.with_attributes(attributes.clone());
    }
    let mask = args
        .url_mask
        .clone()
        .or_else(|| resource_url(&dom, &node, &config.url_attributes));
    if let Some(mask) = mask {
        options = options.with_url_mask(mask);
    }

    let rule = build_rule(&dom, &node, &options)
        .ok_or_else(|| CliError::no_rule(&args.target.node, "nothing selectable"))?;
    let text = rule.to_string();
    Ok(match args.format {
        OutputFormat::Text => text,
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "rule": text,
            "kind": rule.kind,
            "domain": rule.domain,
            "selector": selector_from_rule_text(&text),
        }))?,
    })
}

/// `rulepick selector`
pub fn selector(args: &SelectorArgs) -> CliResult<String> {
    let selector = selector_from_rule_text(&args.rule)
        .ok_or_else(|| CliError::invalid_argument(format!("no selector in {:?}", args.rule)))?;
    let matches = match &args.document {
        Some(path) => {
            let dom = MockDom::load(path)?;
            dom.query_selector_all(&selector)?
                .iter()
                .filter_map(|node| dom.path_of(node))
                .collect()
        }
        None => Vec::new(),
    };
    Ok(match args.format {
        OutputFormat::Text => {
            let mut out = selector;
            for path in &matches {
                out.push('\n');
                out.push_str(path);
            }
            out
        }
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "selector": selector,
            "matches": matches,
        }))?,
    })
}

/// One rung of the scope ladder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeStep {
    /// Slider position, 1-based
    pub position: usize,
    /// Whether this is the picked element
    pub origin: bool,
    /// Child index path below body
    pub path: String,
    /// Tag name
    pub tag: String,
    /// Rule text at this position
    pub rule: String,
}

/// Pick `target` through a full session and record the rule at every
/// slider position
pub fn scope_steps(config: &PickerConfig, target: &TargetArgs, one_domain: bool) -> CliResult<Vec<ScopeStep>> {
    let (mut dom, node) = load_target(target)?;

    let picked = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&picked);
    let mut session = PickerSession::start(
        &mut dom,
        move |chosen: &NodeId| *sink.borrow_mut() = Some(*chosen),
        None,
        config.clone(),
    );
    // embedded content is only reachable through its placeholder
    let click_target = session
        .placeholders()
        .into_iter()
        .find(|placeholder| session.substitutions().original_of(placeholder) == Some(&node))
        .unwrap_or(node);
    session.handle_event(&mut dom, &PickerEvent::mouse_over(click_target));
    session.handle_event(&mut dom, &PickerEvent::click(click_target));
    let Some(picked) = picked.borrow_mut().take() else {
        session.close(&mut dom);
        return Err(CliError::no_rule(&target.node, "element cannot be picked"));
    };

    let mut controller = ScopeController::new(&dom, &picked, config.clone());
    let origin = controller.slider().origin();
    let mut steps = Vec::with_capacity(controller.slider().len());
    for position in 1..=controller.slider().max() {
        let scoped = *controller.move_to(&mut dom, &mut session, position);
        if one_domain {
            controller.set_one_domain(&mut dom, true);
        }
        steps.push(ScopeStep {
            position,
            origin: position == origin,
            path: dom.path_of(&scoped).unwrap_or_default(),
            tag: dom.tag_name(&scoped),
            rule: controller.rule_text().to_string(),
        });
    }
    controller.finish(&mut dom);
    session.close(&mut dom);
    info!(steps = steps.len(), "scope ladder built");
    Ok(steps)
}

/// `rulepick scope`
pub fn scope(config: &PickerConfig, args: &ScopeArgs) -> CliResult<String> {
    let steps = scope_steps(config, &args.target, args.one_domain)?;
    Ok(match args.format {
        OutputFormat::Text => {
            let mut out = String::new();
            for step in &steps {
                let marker = if step.origin { '*' } else { ' ' };
                let _ = writeln!(
                    out,
                    "{marker}{:>3}  {:<10} {:<8} {}",
                    step.position, step.path, step.tag, step.rule
                );
            }
            out.trim_end().to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(&steps)?,
    })
}

/// `rulepick describe`
pub fn describe(config: &PickerConfig, args: &DescribeArgs) -> CliResult<String> {
    let (dom, node) = load_target(&args.target)?;
    let info = describe_node_with(&dom, &node, &config.url_attributes);
    Ok(serde_json::to_string_pretty(&info)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::commands::{RuleTypeArg, SelectorTypeArg};

    const PAGE: &str = r#"{
        "url": "http://www.example.com:8080/news",
        "body": {
            "tag": "body",
            "children": [
                {"tag": "div", "attributes": {"id": "ad1"}, "children": [
                    {"tag": "img", "attributes": {"class": "banner promo", "src": "http://ads.example.net/x.gif"}}
                ]},
                {"tag": "iframe", "attributes": {"src": "http://frames.example.org/slot"},
                 "rect": {"x": 0, "y": 200, "width": 300, "height": 250}},
                {"tag": "p", "text": "story"}
            ]
        }
    }"#;

    fn snapshot() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        std::fs::write(&path, PAGE).unwrap();
        (dir, path)
    }

    fn target(document: PathBuf, node: &str) -> TargetArgs {
        TargetArgs {
            document,
            node: node.to_string(),
        }
    }

    fn rule_args(document: PathBuf, node: &str) -> RuleArgs {
        RuleArgs {
            target: target(document, node),
            rule_type: RuleTypeArg::Css,
            selector: SelectorTypeArg::StrictFull,
            one_domain: false,
            exclude_tag: false,
            exclude_id: false,
            classes: None,
            attributes: None,
            url_mask: None,
            format: OutputFormat::Text,
        }
    }

    mod rule_tests {
        use super::*;

        #[test]
        fn test_strict_full() {
            let (_dir, path) = snapshot();
            let out = rule(&PickerConfig::default(), &rule_args(path, "0/0")).unwrap();
            assert_eq!(out, "example.com##div#ad1 > img.banner.promo");
        }

        #[test]
        fn test_url_and_similar() {
            let (_dir, path) = snapshot();
            let mut args = rule_args(path.clone(), "0/0");
            args.rule_type = RuleTypeArg::Url;
            assert_eq!(
                rule(&PickerConfig::default(), &args).unwrap(),
                "||ads.example.net/x.gif$domain=example.com"
            );
            let mut args = rule_args(path, "0/0");
            args.selector = SelectorTypeArg::Similar;
            assert_eq!(
                rule(&PickerConfig::default(), &args).unwrap(),
                "example.com##.banner, .promo"
            );
        }

        #[test]
        fn test_json_output() {
            let (_dir, path) = snapshot();
            let mut args = rule_args(path, "#ad1");
            args.format = OutputFormat::Json;
            let value: serde_json::Value =
                serde_json::from_str(&rule(&PickerConfig::default(), &args).unwrap()).unwrap();
            assert_eq!(value["rule"], "example.com##div#ad1");
            assert_eq!(value["kind"], "CSS");
            assert_eq!(value["selector"], "div#ad1");
        }

        #[test]
        fn test_missing_node() {
            let (_dir, path) = snapshot();
            let err = rule(&PickerConfig::default(), &rule_args(path, "#nope")).unwrap_err();
            assert!(matches!(err, CliError::Pick(_)));
        }
    }

    mod selector_tests {
        use super::*;

        #[test]
        fn test_matches_listed() {
            let (_dir, path) = snapshot();
            let args = SelectorArgs {
                rule: "||ads.example.net/x.gif$domain=example.com".to_string(),
                document: Some(path),
                format: OutputFormat::Text,
            };
            assert_eq!(selector(&args).unwrap(), "[src*=\"ads.example.net/x.gif\"]\n0/0");
        }

        #[test]
        fn test_unusable_rule() {
            let args = SelectorArgs {
                rule: "example.com##".to_string(),
                document: None,
                format: OutputFormat::Text,
            };
            assert!(matches!(
                selector(&args).unwrap_err(),
                CliError::InvalidArgument { .. }
            ));
        }
    }

    mod scope_tests {
        use super::*;

        #[test]
        fn test_ladder() {
            let (_dir, path) = snapshot();
            let steps = scope_steps(&PickerConfig::default(), &target(path, "0/0"), false).unwrap();
            assert_eq!(steps.len(), 2);
            assert_eq!(steps[0].path, "0");
            assert_eq!(steps[0].rule, "example.com##div#ad1");
            assert!(steps[1].origin);
            assert_eq!(steps[1].rule, "example.com##div#ad1 > img.banner.promo");
        }

        #[test]
        fn test_embedded_target_via_placeholder() {
            let (_dir, path) = snapshot();
            let steps = scope_steps(&PickerConfig::default(), &target(path, "1"), true).unwrap();
            assert_eq!(steps.len(), 1);
            assert_eq!(steps[0].tag, "iframe");
            assert_eq!(steps[0].rule, "##iframe:nth-child(2)");
        }

        #[test]
        fn test_body_cannot_be_picked() {
            let (_dir, path) = snapshot();
            let err = scope_steps(&PickerConfig::default(), &target(path, "body"), false).unwrap_err();
            assert!(matches!(err, CliError::NoRule { .. }));
        }
    }

    #[test]
    fn test_describe() {
        let (_dir, path) = snapshot();
        let args = DescribeArgs {
            target: target(path, "0/0"),
        };
        let value: serde_json::Value =
            serde_json::from_str(&describe(&PickerConfig::default(), &args).unwrap()).unwrap();
        assert_eq!(value["tag_name"], "img");
        assert_eq!(value["has_resource_url"], true);
        assert_eq!(value["resource_url"], "http://ads.example.net/x.gif");
    }
}
