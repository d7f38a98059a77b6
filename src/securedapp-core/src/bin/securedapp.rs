//! SecuredApp CLI - environment trust checks and signed requests.
//!
//! Runs the same evaluator and signer the mobile library uses, so headers
//! and verdicts can be reproduced from a workstation or a device shell.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use securedapp_core::security::{
    is_qemu_kernel, matches_emulator_build, EnvironmentTrustEvaluator, FileSystemRootDetector,
    PlatformSignalProvider, RootDetector, SystemSignalProvider,
};
use securedapp_core::{
    DataState, GuardConfig, GuardError, HttpsTransport, SecureSession, SensitiveDataClient,
    SigningContext, SigningInterceptor, TrustGate, TrustVerdict,
};
use securedapp_keyring::{
    AppIdentity, AppIdentityProvider, CertificateIdentityProvider, KeyMaterialProvider,
    NativeKeyProvider, SecretKeyMaterial,
};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// SecuredApp - environment trust and request signing.
#[derive(Parser)]
#[command(name = "securedapp")]
#[command(version = VERSION)]
#[command(about = "Environment trust checks and signed requests for SecuredApp")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the execution environment
    Check {
        /// Resolve root-detection paths under this directory
        #[arg(long, default_value = "/")]
        root: PathBuf,
    },

    /// Print signing headers
    Sign {
        /// App identity digest to sign with
        #[arg(long, conflicts_with = "cert")]
        identity: Option<String>,

        /// DER signing certificate(s) to derive the identity from
        #[arg(long)]
        cert: Vec<PathBuf>,

        /// Fixed nonce instead of the current time
        #[arg(long)]
        nonce: Option<u64>,

        /// Shared secret instead of the embedded key
        #[arg(long, env = "SECUREDAPP_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Fetch the sensitive data with a signed request
    Fetch {
        /// DER signing certificate(s) to derive the identity from
        #[arg(long)]
        cert: Vec<PathBuf>,

        /// Backend base URL (overrides SECUREDAPP_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Show version, platform and configuration
    Info,
}

// =============================================================================
// Fixed credential sources
// =============================================================================

struct FixedIdentity(Option<AppIdentity>);

impl AppIdentityProvider for FixedIdentity {
    fn app_identity(&self) -> Option<AppIdentity> {
        self.0.clone()
    }
}

struct FixedSecret(String);

impl KeyMaterialProvider for FixedSecret {
    fn secret_key_material(&self) -> Option<SecretKeyMaterial> {
        Some(SecretKeyMaterial::new(self.0.clone()))
    }
}

fn identity_provider(
    identity: Option<String>,
    certs: &[PathBuf],
    config: &GuardConfig,
) -> Result<Arc<dyn AppIdentityProvider>, GuardError> {
    if let Some(identity) = identity {
        return Ok(Arc::new(FixedIdentity(Some(AppIdentity::new(identity)))));
    }
    if certs.is_empty() {
        return Ok(Arc::new(FixedIdentity(None)));
    }
    let provider = CertificateIdentityProvider::from_der_files(certs)?.with_policy(config.signer_policy);
    Ok(Arc::new(provider))
}

fn key_provider(secret: Option<String>) -> Arc<dyn KeyMaterialProvider> {
    match secret {
        Some(secret) => Arc::new(FixedSecret(secret)),
        None => Arc::new(NativeKeyProvider::new()),
    }
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

// =============================================================================
// Commands
// =============================================================================

fn run_check(root: PathBuf, json_output: bool) -> ExitCode {
    let signals: Arc<dyn PlatformSignalProvider> = Arc::new(SystemSignalProvider::new());
    let detector = Arc::new(FileSystemRootDetector::with_root(root).with_properties(Arc::clone(&signals)));
    let evaluator = EnvironmentTrustEvaluator::new(Arc::clone(&signals), detector.clone());
    let verdict = evaluator.evaluate();

    let build = signals.build_info();
    let developer_mode = signals.developer_mode_enabled();
    let emulator_build = matches_emulator_build(&build);
    let qemu_kernel = is_qemu_kernel(signals.as_ref());
    let rooted = detector.is_rooted();

    if json_output {
        print_json(&serde_json::json!({
            "verdict": verdict,
            "signals": {
                "developer_mode": developer_mode,
                "emulator_build": emulator_build,
                "qemu_kernel": qemu_kernel,
                "rooted": rooted,
            },
        }));
    } else {
        println!("\nENVIRONMENT CHECK");
        println!("=================\n");
        println!("  Developer mode:  {}", developer_mode);
        println!("  Emulator build:  {}", emulator_build);
        println!("  QEMU kernel:     {}", qemu_kernel);
        println!("  Root indicators: {}", rooted);
        println!();
        println!("Verdict: {}", verdict);
    }

    if verdict.is_secure() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_sign(
    identity: Option<String>,
    certs: Vec<PathBuf>,
    nonce: Option<u64>,
    secret: Option<String>,
    json_output: bool,
) -> Result<(), GuardError> {
    let config = GuardConfig::from_env()?;
    let identity = identity_provider(identity, &certs, &config)?;
    let keys = key_provider(secret);

    let context = match nonce {
        Some(nonce) => {
            let key = keys
                .secret_key_material()
                .ok_or(GuardError::KeyMaterialUnavailable)?;
            SigningContext::build(identity.app_identity().as_ref(), &key, nonce)?
        },
        None => SigningInterceptor::new(identity, keys).signing_context()?,
    };

    if json_output {
        let headers: serde_json::Map<String, serde_json::Value> = context
            .headers()
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        print_json(&serde_json::json!({
            "signing_input": context.signing_input,
            "headers": headers,
        }));
    } else {
        println!("Signing input: {}", context.signing_input);
        for (name, value) in context.headers() {
            println!("{}: {}", name, value);
        }
    }
    Ok(())
}

async fn run_fetch(
    certs: Vec<PathBuf>,
    base_url: Option<String>,
    json_output: bool,
) -> Result<bool, GuardError> {
    let mut config = GuardConfig::from_env()?;
    if let Some(base_url) = base_url {
        config.base_url = base_url;
        config.validate()?;
    }

    let identity = identity_provider(None, &certs, &config)?;
    let interceptor = Arc::new(SigningInterceptor::new(identity, key_provider(None)));
    let transport = Arc::new(HttpsTransport::new(&config)?);
    let evaluator = EnvironmentTrustEvaluator::for_system(Arc::new(SystemSignalProvider::new()));
    let gate = Arc::new(TrustGate::new(Arc::new(evaluator)));
    let client = Arc::new(SensitiveDataClient::new(&config, gate, interceptor, transport));
    let session = SecureSession::start(client).await;

    let verdict = *session.trust_verdict().borrow();
    if verdict != TrustVerdict::Secure {
        if json_output {
            print_json(&serde_json::json!({ "verdict": verdict }));
        } else {
            println!("Refusing to fetch: environment is {}", verdict);
        }
        return Ok(false);
    }

    session.fetch_sensitive_data().await?;
    let state = session.data_state().borrow().clone();

    if json_output {
        print_json(&serde_json::json!({ "verdict": verdict, "data": state }));
    } else {
        match &state {
            DataState::Success(data) => {
                println!("{}", data.message);
                println!();
                println!("  {}", data.data.title);
                println!("  {}", data.data.description);
            },
            DataState::Error(message) => println!("Error: {}", message),
            DataState::Idle | DataState::Loading => println!("No result"),
        }
    }
    Ok(matches!(state, DataState::Success(_)))
}

fn show_info() {
    println!("\nSYSTEM INFORMATION");
    println!("==================\n");
    println!("SecuredApp Version: {}", VERSION);
    println!();
    println!("Platform:");
    println!("  OS: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!();
    match GuardConfig::from_env() {
        Ok(config) => {
            println!("Configuration:");
            println!("  Endpoint: {}", config.sensitive_data_url());
            println!("  Timeout: {}s", config.timeout.as_secs());
            println!("  Signer policy: {:?}", config.signer_policy);
        },
        Err(e) => println!("Configuration: invalid ({})", e),
    }
    println!();
    println!("Signing: HMAC-SHA256 over \"<identity>.<nonce>\"");
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let json_output = cli.format == "json";

    let level = if json_output {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();

    match cli.command {
        Some(Commands::Check { root }) => run_check(root, json_output),
        Some(Commands::Sign {
            identity,
            cert,
            nonce,
            secret,
        }) => match run_sign(identity, cert, nonce, secret, json_output) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Signing failed: {}", e);
                ExitCode::FAILURE
            },
        },
        Some(Commands::Fetch { cert, base_url }) => {
            match run_fetch(cert, base_url, json_output).await {
                Ok(true) => ExitCode::SUCCESS,
                Ok(false) => ExitCode::FAILURE,
                Err(e) => {
                    eprintln!("Fetch failed: {}", e);
                    ExitCode::FAILURE
                },
            }
        },
        Some(Commands::Info) => {
            show_info();
            ExitCode::SUCCESS
        },
        None => {
            println!("SecuredApp {}", VERSION);
            println!("Run with --help for usage.");
            ExitCode::SUCCESS
        },
    }
}
