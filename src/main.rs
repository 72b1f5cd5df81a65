use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use log::LevelFilter;
use phishcheck::config::Config;
use phishcheck::controller::{AnalysisFlow, Panel, SubmissionController};
use phishcheck::render::{render_view, RenderResult};
use phishcheck::{AuthClient, DomainFlow, EmailFlow, HttpTransport, SessionStore};
use std::io::Read;
use std::process;

fn cli() -> Command {
    Command::new("phishcheck")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Submit emails and domains to a phishing analysis service")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .global(true),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .value_name("URL")
                .help("Analysis service base URL (overrides config and API_BASE_URL)")
                .global(true),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("login")
                .about("Log in and remember the session")
                .arg(
                    Arg::new("username")
                        .short('u')
                        .long("username")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("register")
                .about("Create a new account")
                .arg(
                    Arg::new("username")
                        .short('u')
                        .long("username")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .required(true),
                )
                .arg(Arg::new("email").short('e').long("email").required(true)),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(Command::new("whoami").about("Show the logged-in user"))
        .subcommand(
            Command::new("domain")
                .about("Check a domain or URL")
                .arg(
                    Arg::new("target")
                        .value_name("DOMAIN_OR_URL")
                        .help("Domain or URL to check")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("email")
                .about("Analyze an email body")
                .arg(
                    Arg::new("text")
                        .value_name("TEXT")
                        .help("Email body text")
                        .conflicts_with("file"),
                )
                .arg(
                    Arg::new("file")
                        .short('f')
                        .long("file")
                        .value_name("FILE")
                        .help("Read the email body from FILE, or stdin when FILE is '-'"),
                )
                .arg(
                    Arg::new("sender")
                        .long("sender")
                        .value_name("ADDRESS")
                        .help("Sender address to send along with the body"),
                )
                .arg(
                    Arg::new("subject")
                        .long("subject")
                        .value_name("SUBJECT")
                        .help("Subject line to send along with the body"),
                ),
        )
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = cli().get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config = match load_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    match run(&matches, &config).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env();
    config.apply_overrides(matches.get_one::<String>("api-url").cloned(), None);
    config.base_url()?;
    Ok(config)
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => println!("Default configuration written to: {path}"),
        Err(e) => {
            eprintln!("Error writing configuration: {e}");
            process::exit(1);
        }
    }
}

fn transport(config: &Config) -> anyhow::Result<HttpTransport> {
    HttpTransport::new(config.base_url()?, &config.user_agent)
        .context("Failed to build HTTP client")
}

async fn run(matches: &ArgMatches, config: &Config) -> anyhow::Result<i32> {
    let mut store = SessionStore::load(&config.session_file)?;

    match matches.subcommand() {
        Some(("login", sub)) => {
            let username = required(sub, "username")?;
            let password = required(sub, "password")?;
            let client = AuthClient::new(transport(config)?);

            match client.login(username, password).await {
                Ok(outcome) => {
                    if let (Some(user_id), Some(name)) =
                        (outcome.session.user_id(), outcome.session.username())
                    {
                        store.login(user_id, name)?;
                    }
                    println!("✅ {}", outcome.message);
                    Ok(0)
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    Ok(1)
                }
            }
        }
        Some(("register", sub)) => {
            let client = AuthClient::new(transport(config)?);
            let result = client
                .register(
                    required(sub, "username")?,
                    required(sub, "password")?,
                    required(sub, "email")?,
                )
                .await;

            match result {
                Ok(message) => {
                    println!("✅ {message}");
                    Ok(0)
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    Ok(1)
                }
            }
        }
        Some(("logout", _)) => {
            store.logout()?;
            println!("Logged out");
            Ok(0)
        }
        Some(("whoami", _)) => match store.session().username() {
            Some(name) => {
                println!("{name}");
                Ok(0)
            }
            None => {
                println!("Not logged in");
                Ok(1)
            }
        },
        Some(("domain", sub)) => {
            let target = required(sub, "target")?;
            let controller =
                SubmissionController::new(DomainFlow, transport(config)?, store.session().clone());
            Ok(analyze(controller, target, &store).await)
        }
        Some(("email", sub)) => {
            let body = email_body(sub)?;
            let flow = EmailFlow {
                sender: sub.get_one::<String>("sender").cloned(),
                subject: sub.get_one::<String>("subject").cloned(),
            };
            let controller =
                SubmissionController::new(flow, transport(config)?, store.session().clone());
            Ok(analyze(controller, &body, &store).await)
        }
        _ => {
            cli().print_help()?;
            println!();
            Ok(2)
        }
    }
}

async fn analyze<F>(
    mut controller: SubmissionController<F, HttpTransport, phishcheck::Session>,
    subject: &str,
    store: &SessionStore,
) -> i32
where
    F: AnalysisFlow,
    F::Output: RenderResult,
{
    controller.submit(subject).await;
    let state = controller.snapshot();
    print!(
        "{}",
        render_view(controller.flow().name(), &state, store.session())
    );

    match state.panel() {
        Panel::Result => 0,
        _ => 1,
    }
}

fn email_body(sub: &ArgMatches) -> anyhow::Result<String> {
    if let Some(text) = sub.get_one::<String>("text") {
        return Ok(text.clone());
    }

    match sub.get_one::<String>("file").map(String::as_str) {
        Some("-") | None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("Failed to read email body from stdin")?;
            Ok(body)
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read email body from {path}")),
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing argument: {name}"))
}
