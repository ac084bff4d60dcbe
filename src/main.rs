use anyhow::{anyhow, Context};
use clap::{value_parser, Arg, ArgMatches, Command};
use frontend_harness::pages::{load_page_data, MatchingEngineHome, MatchingEngineHomeData};
use frontend_harness::report::{write_environment_file, EnvironmentValues};
use frontend_harness::{AllureResultsSink, ChromeSession, Harness, HarnessConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const PRODUCTS_SUPPORTED_OPTION: &str = "Products Supported";
const PRODUCTS_SUPPORTED_HEADING: &str = "There are several types of Product Supported:";
const EXPECTED_PRODUCTS: [&str; 4] = ["Cue Sheet / AV Work", "Recording", "Bundle", "Advertisement"];

fn cli() -> Command {
    Command::new("frontend-harness")
        .about("Browser UI harness for the matching engine front end")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("set-env")
                .about("Write env, os and browser into an Allure environment.xml")
                .arg(Arg::new("env").required(true).help("Environment name, e.g. qa"))
                .arg(Arg::new("driver").required(true).help("Browser driver, e.g. chrome"))
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("environment.xml to patch in place"),
                ),
        )
        .subcommand(
            Command::new("smoke")
                .about("Run the products-supported scenario in Chrome")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("data-dir")
                        .long("data-dir")
                        .default_value("data")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("results-dir")
                        .long("results-dir")
                        .default_value("allure-results")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("set-env", args)) => set_env(args).await,
        Some(("smoke", args)) => smoke(args).await,
        Some((other, _)) => Err(anyhow!("unknown command '{}'", other)),
        None => Err(anyhow!("no command given")),
    }
}

async fn set_env(args: &ArgMatches) -> anyhow::Result<()> {
    let env = args.get_one::<String>("env").context("env is required")?;
    let driver = args
        .get_one::<String>("driver")
        .context("driver is required")?;
    let file = args.get_one::<PathBuf>("file").context("file is required")?;

    let values = EnvironmentValues::current(env.as_str(), driver.as_str());
    info!(os = %values.os, env = %values.env, browser = %values.browser, "allure environment");

    write_environment_file(file, &values)
        .await
        .with_context(|| format!("patching {}", file.display()))?;
    Ok(())
}

async fn smoke(args: &ArgMatches) -> anyhow::Result<()> {
    let config_path = args
        .get_one::<PathBuf>("config")
        .context("config is required")?;
    let data_dir = args
        .get_one::<PathBuf>("data-dir")
        .context("data-dir is required")?;
    let results_dir = args
        .get_one::<PathBuf>("results-dir")
        .context("results-dir is required")?;

    let config = HarnessConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let home_data: MatchingEngineHomeData =
        load_page_data(data_dir).context("loading page data")?;
    let sink = AllureResultsSink::create(results_dir.clone())
        .await
        .with_context(|| format!("opening {}", results_dir.display()))?;

    let harness = Harness::open_browser(config).context("launching chrome")?;
    let home = MatchingEngineHome::new(harness.clone(), home_data);

    let outcome = products_supported(&home).await;
    harness
        .finish(&sink, "products_supported", outcome)
        .await?;
    info!("products supported scenario passed");
    Ok(())
}

async fn products_supported(home: &MatchingEngineHome<ChromeSession>) -> anyhow::Result<()> {
    home.navigate_to_home().await?;
    home.click_header_option("Modules").await?;
    home.click_header_option("Repertoire Management Module")
        .await?;
    home.click_products_supported(PRODUCTS_SUPPORTED_OPTION, PRODUCTS_SUPPORTED_HEADING)
        .await?;
    home.assert_products_supported(&EXPECTED_PRODUCTS).await?;
    Ok(())
}
