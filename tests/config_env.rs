// tests/config_env.rs
//
// AppConfig::from_env: file discovery, env precedence, mandatory CRM token.
// Env and CWD are process-global, so every test here runs serially.

use std::{env, fs};

use serial_test::serial;

use crm_panel_proxy::AppConfig;

const VARS: &[&str] = &[
    "PANEL_CONFIG_PATH",
    "HUBSPOT_ACCESS_TOKEN",
    "HUBSPOT_API_BASE",
    "HUBSPOT_DEAL_CONTACT_ASSOCIATION_TYPE_ID",
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_API_BASE",
    "ANTHROPIC_MODEL",
    "PORT",
    "SHUTDOWN_GRACE_SECS",
    "PANEL_METRICS",
];

fn clear_env() {
    for v in VARS {
        env::remove_var(v);
    }
}

/// Run `f` inside an empty temp CWD so the repo's config/ is not picked up.
fn in_temp_cwd<F: FnOnce(&std::path::Path)>(f: F) {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();
    f(tmp.path());
    clear_env();
    env::set_current_dir(old).unwrap();
}

#[test]
#[serial]
fn missing_token_names_the_variable() {
    in_temp_cwd(|_| {
        let err = AppConfig::from_env().unwrap_err();
        assert!(format!("{err:#}").contains("HUBSPOT_ACCESS_TOKEN"));
    });
}

#[test]
#[serial]
fn defaults_without_file() {
    in_temp_cwd(|_| {
        env::set_var("HUBSPOT_ACCESS_TOKEN", "pat-env");
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.crm.token, "pat-env");
        assert!(!cfg.ai.is_configured());
    });
}

#[test]
#[serial]
fn default_file_is_read_and_env_wins() {
    in_temp_cwd(|dir| {
        fs::create_dir_all(dir.join("config")).unwrap();
        fs::write(
            dir.join("config/panel.toml"),
            "[server]\nport = 4000\nshutdown_grace_secs = 3\n\n[ai]\nmodel = \"from-file\"\n",
        )
        .unwrap();
        env::set_var("HUBSPOT_ACCESS_TOKEN", "pat-env");
        env::set_var("ANTHROPIC_MODEL", "from-env");
        env::set_var("ANTHROPIC_API_KEY", "sk-env");

        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.shutdown_grace.as_secs(), 3);
        assert_eq!(cfg.ai.model, "from-env");
        assert!(cfg.ai.is_configured());
    });
}

#[test]
#[serial]
fn explicit_path_must_exist() {
    in_temp_cwd(|dir| {
        env::set_var("HUBSPOT_ACCESS_TOKEN", "pat-env");
        env::set_var("PANEL_CONFIG_PATH", dir.join("nope.toml"));
        assert!(AppConfig::from_env().is_err());

        let custom = dir.join("custom.toml");
        fs::write(&custom, "[crm.deal_contact_association]\ntype_id = 279\n").unwrap();
        env::set_var("PANEL_CONFIG_PATH", &custom);
        let cfg = AppConfig::from_env().unwrap();
        assert_eq!(cfg.crm.deal_contact_association.type_id, 279);
    });
}

#[test]
#[serial]
fn blank_values_count_as_unset() {
    in_temp_cwd(|_| {
        env::set_var("HUBSPOT_ACCESS_TOKEN", "pat-env");
        env::set_var("ANTHROPIC_API_KEY", "   ");
        env::set_var("PORT", "");
        let cfg = AppConfig::from_env().unwrap();
        assert!(!cfg.ai.is_configured());
        assert_eq!(cfg.port, 3001);
    });
}
