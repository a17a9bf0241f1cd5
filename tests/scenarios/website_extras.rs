//! Scenario: File mappings and per-tenant web assets

use std::fs;

use serde_json::json;

use crate::assert_deployed;
use crate::common::*;

/// SCENARIO: an absolute mapping is copied once and survives deletion passes
#[test]
fn scenario_file_mapping_outside_source_tree() {
    let env = TestEnv::new();
    env.write_source("index.html", "<html>", 100);
    let robots = env.write("shared/robots.txt", "User-agent: *", 100);
    env.write_config(json!({
        "website": {
            "file_mappings": [
                {"source": robots, "destination": "robots.txt"}
            ]
        }
    }));

    let result = env.run(&[]);
    assert!(result.is_success(), "stderr: {}", result.stderr);
    assert!(result.stdout.contains("mappings: 1 written"), "{}", result.stdout);
    assert_deployed!(env, "robots.txt");

    let result = env.run(&[]);
    assert!(result.is_success());
    assert!(!result.stdout.contains("mappings:"), "{}", result.stdout);
    assert_deployed!(env, "robots.txt");

    let cache = env.read_cache();
    let key = robots.to_string_lossy().to_string();
    assert_eq!(cache["file_mappings"][key.as_str()]["mtime"], 100.0);
}

/// SCENARIO: each tenant gets its config, assets and generated CSS
#[test]
fn scenario_tenant_web_assets() {
    let env = TestEnv::new();
    env.write_source("index.html", "<html>", 100);
    env.write("tenants/acme.json", r#"{"webid": "acme"}"#, 100);
    env.write("assets/acme/logo.svg", "<svg/>", 100);
    env.write("css/acme/theme.css", "body{}", 100);
    env.write("css/acme/notes.txt", "skip me", 100);
    env.write_config(json!({
        "tenants": {"config_files_path": env.path("tenants")},
        "website": {
            "tenant-website": {
                "enabled": true,
                "assets_path": format!("{}/{{{{WEBID}}}}", env.path("assets").display()),
                "generated_css_path": env.path("css")
            }
        }
    }));

    let result = env.run(&[]);
    assert!(result.is_success(), "stderr: {}", result.stderr);
    assert!(result.stdout.contains("web tenants: acme"), "{}", result.stdout);
    assert_deployed!(env, "web/tenants/_config/acme.json");
    assert_deployed!(env, "web/tenants/acme/logo.svg");
    assert_deployed!(env, "web/generated/css/acme/theme.css");
    assert!(!env
        .destination_path("web/generated/css/acme/notes.txt")
        .exists());

    // Unchanged inputs: nothing redeployed.
    let result = env.run(&[]);
    assert!(!result.stdout.contains("web tenants:"), "{}", result.stdout);

    fs::remove_file(env.destination_path("web/tenants/acme/logo.svg")).unwrap();
    env.write("assets/acme/logo.svg", "<svg v2/>", 300);
    let result = env.run(&[]);
    assert!(result.stdout.contains("web tenants: acme"), "{}", result.stdout);
    assert_eq!(
        env.read_destination("web/tenants/acme/logo.svg").as_deref(),
        Some("<svg v2/>")
    );
}
