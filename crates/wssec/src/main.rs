#![forbid(unsafe_code)]

//! wssec CLI: resolve the SecurityTokenReferences of a SOAP message.

use base64::Engine;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use wssec::header::{parse_references, HeaderPass, ParsingProcessor, ReferenceSite};
use wssec_core::{algorithm, ns, Error};
use wssec_crypto::kdf::{self, DerivationAlgorithm, DerivationSpec};
use wssec_keys::CertificateStore;
use wssec_str::{resolve, ComplianceMode, Credential, DerivationParams, PrincipalToken, SecretMap};
use wssec_xml::SecurityDocument;

#[derive(Parser)]
#[command(
    name = "wssec",
    about = "wssec: WS-Security SecurityTokenReference resolution",
    version
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every SecurityTokenReference in a SOAP message
    Resolve {
        /// Input SOAP message
        file: PathBuf,

        /// Load X.509 certificate into the credential store (PEM or DER)
        #[arg(long)]
        cert: Vec<PathBuf>,

        /// Secret for a token or key identifier (ID=HEX)
        #[arg(long)]
        secret: Vec<String>,

        /// Password for a UsernameToken user (USER=PASSWORD)
        #[arg(long)]
        password: Vec<String>,

        /// Algorithm URI the resolved keys are sized for
        #[arg(long, default_value = algorithm::HMAC_SHA1)]
        algorithm: String,

        /// Explicit secret key length in bytes
        #[arg(long = "secret-key-length")]
        secret_key_length: Option<u32>,

        /// Skip Basic Security Profile checks
        #[arg(long)]
        permissive: bool,

        /// Register additional ID attribute names
        #[arg(long = "id-attr")]
        id_attr: Vec<String>,
    },

    /// Derive a key with P_SHA1
    Derive {
        /// Base secret (hex)
        #[arg(long)]
        secret: String,

        /// Nonce (base64)
        #[arg(long)]
        nonce: String,

        /// Label (default: WS-SecureConversationWS-SecureConversation)
        #[arg(long)]
        label: Option<String>,

        /// Bytes of output to skip
        #[arg(long, default_value_t = 0)]
        offset: u32,

        /// Bytes to derive
        #[arg(long, default_value_t = 32)]
        length: u32,
    },

    /// Show supported token types
    Info,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Resolve {
            file,
            cert,
            secret,
            password,
            algorithm,
            secret_key_length,
            permissive,
            id_attr,
        } => cmd_resolve(
            file,
            cert,
            secret,
            password,
            DerivationParams {
                algorithm: Some(algorithm),
                secret_key_length,
            },
            permissive,
            id_attr,
        ),

        Commands::Derive {
            secret,
            nonce,
            label,
            offset,
            length,
        } => cmd_derive(&secret, &nonce, label, offset, length),

        Commands::Info => cmd_info(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_resolve(
    file: PathBuf,
    certs: Vec<PathBuf>,
    secrets: Vec<String>,
    passwords: Vec<String>,
    derivation: DerivationParams,
    permissive: bool,
    id_attr: Vec<String>,
) -> Result<(), Error> {
    let xml = std::fs::read_to_string(&file)?;
    let doc = wssec_xml::parse(&xml)?;
    let extra: Vec<&str> = id_attr.iter().map(String::as_str).collect();
    let sdoc = SecurityDocument::with_id_attrs(&doc, &extra);

    let mut store = CertificateStore::new();
    for path in &certs {
        store.load_file(path)?;
    }
    let secret_map = build_secret_map(&secrets, &passwords)?;
    let processor = ParsingProcessor::new(&secret_map);
    let pass = HeaderPass {
        store: &store,
        callback: &secret_map,
        processor: &processor,
        compliance: if permissive {
            ComplianceMode::Permissive
        } else {
            ComplianceMode::Strict
        },
        derivation: &derivation,
    };

    let security = sdoc
        .find_element(ns::WSSE, ns::node::SECURITY)
        .ok_or_else(|| Error::XmlStructure("no wsse:Security header".into()))?;
    let results = pass.index_tokens(&sdoc, security)?;
    tracing::info!(tokens = results.len(), "indexed security header");

    let references = parse_references(&sdoc)?;
    if references.is_empty() {
        println!("No SecurityTokenReference found in {}", file.display());
        return Ok(());
    }
    let ctx = pass.context(&sdoc, &results);
    for (site, reference) in &references {
        let label = match site {
            ReferenceSite::Signature => "Signature",
            ReferenceSite::EncryptedData => "EncryptedData",
            ReferenceSite::EncryptedKey => "EncryptedKey",
        };
        let target = reference.lookup_id().unwrap_or("X509IssuerSerial");
        println!("{label} -> {target}");
        let credential = resolve(reference, &ctx)?;
        print_credential(&credential);
    }
    Ok(())
}

fn print_credential(credential: &Credential) {
    println!("  principal: {}", credential.principal.name);
    match &credential.principal.token {
        Some(PrincipalToken::UsernameToken(_)) => println!("  principal token: UsernameToken"),
        Some(PrincipalToken::DerivedKey(dk)) => println!(
            "  principal token: DerivedKeyToken (offset {}, length {})",
            dk.offset, dk.length
        ),
        Some(PrincipalToken::Saml(assertion)) => {
            println!("  principal token: SAML {:?} assertion", assertion.version)
        }
        None => {}
    }
    for cert in &credential.certificates {
        println!("  certificate: {}", cert.subject_name());
        println!("    issuer: {}", cert.issuer_name());
        println!("    serial: {}", cert.serial_number());
    }
    if let Some(key) = &credential.public_key {
        println!("  public key: {}", key.algorithm_name());
    }
    if let Some(secret) = credential.secret_key() {
        println!("  secret key: {}", hex::encode(secret));
    }
    println!("  trusted: {}", credential.trusted);
}

fn cmd_derive(
    secret: &str,
    nonce: &str,
    label: Option<String>,
    offset: u32,
    length: u32,
) -> Result<(), Error> {
    let secret = zeroize::Zeroizing::new(
        hex::decode(secret.trim())
            .map_err(|e| Error::Configuration(format!("--secret is not hex: {e}")))?,
    );
    let nonce = base64::engine::general_purpose::STANDARD
        .decode(nonce.trim())
        .map_err(|e| Error::Base64(format!("--nonce: {e}")))?;
    let label = label.unwrap_or_else(|| algorithm::WSC_DEFAULT_LABEL.repeat(2));
    let spec = DerivationSpec {
        secret: &secret,
        label: label.as_bytes(),
        nonce: &nonce,
        offset,
        length,
        algorithm: DerivationAlgorithm::PSha1,
    };
    let key = zeroize::Zeroizing::new(kdf::derive(&spec)?);
    println!("{}", hex::encode(key.as_slice()));
    Ok(())
}

fn cmd_info() -> Result<(), Error> {
    println!("wssec: WS-Security SecurityTokenReference resolution");
    println!();
    println!("Reference forms:");
    println!("  Direct Reference (local #id and external URI)");
    println!("  KeyIdentifier");
    println!("  X509Data / X509IssuerSerial");
    println!();
    println!("KeyIdentifier types:");
    println!("  X509v3, X509SubjectKeyIdentifier, ThumbprintSHA1");
    println!("  EncryptedKeySHA1");
    println!("  SAMLAssertionID (SAML 1.1), SAMLID (SAML 2.0)");
    println!();
    println!("Tokens:");
    println!("  BinarySecurityToken (X509v3, X509PKIPathv1)");
    println!("  UsernameToken (Profile 1.1 derived key, WSE secret)");
    println!("  DerivedKeyToken (WS-SC 2005/02 and 2005/12, P_SHA1)");
    println!("  SecurityContextToken, EncryptedKey");
    println!("  SAML 1.1 / 2.0 assertions (holder-of-key)");
    println!();
    println!("Compliance:");
    println!("  Basic Security Profile 1.1 checks (disable with --permissive)");
    Ok(())
}

// ── Utility functions ────────────────────────────────────────────────

fn build_secret_map(secrets: &[String], passwords: &[String]) -> Result<SecretMap, Error> {
    let mut map = SecretMap::new();
    for spec in secrets {
        let (id, value) = spec.split_once('=').ok_or_else(|| {
            Error::Configuration(format!("invalid --secret: {spec} (expected ID=HEX)"))
        })?;
        let bytes = hex::decode(value)
            .map_err(|e| Error::Configuration(format!("--secret {id}: {e}")))?;
        map.insert_secret(id, bytes);
    }
    for spec in passwords {
        let (user, password) = spec.split_once('=').ok_or_else(|| {
            Error::Configuration("invalid --password (expected USER=PASSWORD)".into())
        })?;
        map.insert_password(user, password);
    }
    Ok(map)
}
