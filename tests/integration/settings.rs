use pprb::config::Settings;
use pprb::test_utils::TestTree;
use pprb::{CompileOptions, Preprocessor};
use serial_test::serial;

/// Run `f` with `PPRB_CONFIG` pointing at `path`, restoring it afterwards.
fn with_config_env<T>(path: &std::path::Path, f: impl FnOnce() -> T) -> T {
    let previous = std::env::var_os("PPRB_CONFIG");
    // SAFETY: tests touching the environment are serialized.
    unsafe { std::env::set_var("PPRB_CONFIG", path) };
    let result = f();
    match previous {
        // SAFETY: see above.
        Some(value) => unsafe { std::env::set_var("PPRB_CONFIG", value) },
        // SAFETY: see above.
        None => unsafe { std::env::remove_var("PPRB_CONFIG") },
    }
    result
}

#[test]
#[serial]
fn test_settings_from_environment() {
    let tree = TestTree::new().unwrap();
    let config = tree.write("settings.toml", "rules_file = \"site.rules\"\n").unwrap();

    let settings = with_config_env(&config, Settings::load).unwrap();
    assert_eq!(settings.rules_file, "site.rules");
    assert_eq!(settings.module_extension, "pprb.i");
}

#[test]
#[serial]
fn test_missing_settings_file_gives_defaults() {
    let tree = TestTree::new().unwrap();
    let settings = with_config_env(&tree.path("absent.toml"), Settings::load).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_settings_change_module_lookup() {
    let tree = TestTree::new().unwrap();
    tree.write("lib/util.lua.i", "helper = 'from lib'\n").unwrap();
    tree.write("page.txt", ">use('util')\n`helper`\n").unwrap();

    let settings = Settings {
        module_extension: "lua.i".to_string(),
        modules_dir: "lib".to_string(),
        ..Settings::default()
    };
    let options = CompileOptions::new().with_settings(settings).silent();
    let preprocessor =
        Preprocessor::compile_with(&tree.source("page.txt").unwrap(), options).unwrap();
    assert_eq!(preprocessor.run().unwrap(), "from lib\n");
}

#[test]
fn test_settings_choose_rules_file() {
    let tree = TestTree::new().unwrap();
    tree.write("site.rules", "profile('comment_embedded')\n").unwrap();
    tree.write("main.c", "// %if true\nint x;\n// -\n").unwrap();

    let settings = Settings {
        rules_file: "site.rules".to_string(),
        ..Settings::default()
    };
    let options = CompileOptions::new().with_settings(settings).silent();
    let preprocessor =
        Preprocessor::compile_with(&tree.source("main.c").unwrap(), options).unwrap();
    assert_eq!(preprocessor.run().unwrap(), "int x;\n");
}
