//! Layering behaviour of the `ortho_config` loader.

use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use rstest::rstest;
use searchgate_config::{Config, LogFormat, Scheme, SocketEndpoint, default_socket_endpoint};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner)
}

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    guard: Option<MutexGuard<'static, ()>>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = env_lock();
        let previous = std::env::var_os(key);
        // Environment mutation is unsafe in edition 2024; the guard serialises
        // access across tests in this binary.
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            guard: Some(guard),
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
        drop(self.guard.take());
    }
}

fn load(args: &[&str]) -> Config {
    let _lock = env_lock();
    let argv = std::iter::once("searchgated")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect::<Vec<_>>();
    Config::load_from_iter(argv).expect("configuration should load")
}

#[test]
fn loads_built_in_defaults() {
    let config = load(&[]);

    assert_eq!(config, Config::default());
    assert_eq!(config.listen(), &default_socket_endpoint());
    assert_eq!(config.plugin_dir(), "plugins");
    assert_eq!(config.backend_host, "localhost");
    assert_eq!(config.backend_port, 9200);
    assert_eq!(config.backend_scheme, Scheme::Http);
    assert_eq!(config.connect_timeout_ms, 5000);
    assert_eq!(config.socket_timeout_ms, 30_000);
    assert_eq!(config.backend_username, None);
    assert_eq!(config.log_filter(), "info");
    assert_eq!(config.log_format(), LogFormat::Json);
}

#[test]
fn bare_start_yields_a_usable_connection() {
    let connection = load(&[])
        .connection_config()
        .expect("defaults form a valid connection");
    assert_eq!(connection.to_string(), "http://localhost:9200");
}

#[rstest]
#[case::host(&["--backend-host", "search.internal"], "search.internal", 9200)]
#[case::port(&["--backend-port", "9243"], "localhost", 9243)]
fn cli_flags_override_defaults(
    #[case] args: &[&str],
    #[case] host: &str,
    #[case] port: u16,
) {
    let config = load(args);
    assert_eq!(config.backend_host, host);
    assert_eq!(config.backend_port, port);
}

#[test]
fn cli_flag_selects_tcp_listener() {
    let config = load(&["--listen", "tcp://127.0.0.1:9781"]);
    assert_eq!(config.listen(), &SocketEndpoint::tcp("127.0.0.1", 9781));
}

#[test]
fn environment_overrides_defaults_and_cli_overrides_environment() {
    let argv = |extra: &[&str]| {
        std::iter::once("searchgated")
            .chain(extra.iter().copied())
            .map(OsString::from)
            .collect::<Vec<_>>()
    };

    let env = EnvOverride::set_var("SEARCHGATE_BACKEND_HOST", OsStr::new("from-env"));
    let from_env = Config::load_from_iter(argv(&[])).expect("env config should load");
    let from_cli = Config::load_from_iter(argv(&["--backend-host", "from-cli"]))
        .expect("cli config should load");
    drop(env);

    assert_eq!(from_env.backend_host, "from-env");
    assert_eq!(from_cli.backend_host, "from-cli");
}

#[test]
fn environment_accepts_listen_urls() {
    let env = EnvOverride::set_var("SEARCHGATE_LISTEN", OsStr::new("tcp://127.0.0.1:9782"));
    let config = Config::load_from_iter([OsString::from("searchgated")])
        .expect("env config should load");
    drop(env);

    assert_eq!(config.listen(), &SocketEndpoint::tcp("127.0.0.1", 9782));
}

#[test]
fn rejects_unparseable_listener() {
    let _lock = env_lock();
    let argv = ["searchgated", "--listen", "invalid://socket"].map(OsString::from);
    let error = Config::load_from_iter(argv).expect_err("invalid endpoint must fail");
    assert!(!error.to_string().is_empty());
}
