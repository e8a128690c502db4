use std::path::PathBuf;

use anyhow::{Context, Result};
use bus_demand::{
    ApiClient, HistoryPresentation, HistoryRow, HistoryView, Occasion, PredictionDashboard,
    PredictionScreen, PredictionView, Season, TimePeriod,
    config::AppConfig,
    locations::LocationDirectory,
    prediction::HISTORY_ROUTE,
    workflow::WorkflowState,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "bus-demand")]
#[command(about = "Passenger demand predictions for bus routes")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the selectable locations
    Locations,
    /// Request a demand prediction for a route
    Predict {
        /// Start location id
        #[arg(long)]
        from: String,
        /// End location id
        #[arg(long)]
        to: String,
        /// Morning, Afternoon, Evening, Night or Full_Day
        #[arg(long, default_value_t = TimePeriod::FullDay)]
        period: TimePeriod,
        /// Regular, Weekend, Holiday, Festival or "Special Event"
        #[arg(long, default_value_t = Occasion::Regular)]
        occasion: Occasion,
        /// Spring, Summer, Fall or Winter
        #[arg(long, default_value_t = Season::Summer)]
        season: Season,
    },
    /// Show past predictions, newest first
    History {
        /// Also write the records to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy(std::env::var("RUST_LOG").unwrap_or_else(|_| "bus_demand=debug".into()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let client = ApiClient::new(&config.api, &config.network)?;
    tracing::debug!("Using prediction service at {}", client.base_url());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(async move {
        match args.command {
            Command::Locations => run_locations(&client).await,
            Command::Predict {
                from,
                to,
                period,
                occasion,
                season,
            } => run_predict(&client, from, to, period, occasion, season).await,
            Command::History { export } => run_history(&client, export).await,
        }
    })
}

async fn run_locations(client: &ApiClient) -> Result<()> {
    let mut directory = LocationDirectory::new();
    directory.load(client).await;

    match directory.state() {
        WorkflowState::Success(locations) => {
            for location in locations {
                match &location.description {
                    Some(description) => {
                        println!("{:>4}  {}  ({})", location.id, location.name, description)
                    }
                    None => println!("{:>4}  {}", location.id, location.name),
                }
            }
            Ok(())
        }
        WorkflowState::Error(message) => anyhow::bail!("{}", message),
        WorkflowState::Idle | WorkflowState::Loading => anyhow::bail!("Locations did not load"),
    }
}

async fn run_predict(
    client: &ApiClient,
    from: String,
    to: String,
    period: TimePeriod,
    occasion: Occasion,
    season: Season,
) -> Result<()> {
    let mut screen = PredictionScreen::new();
    screen.mount(client).await;
    if let Some(message) = screen.directory().state().error() {
        anyhow::bail!("{}", message);
    }

    screen
        .form_mut()
        .set_start_location(from)
        .set_end_location(to)
        .set_time_period(period)
        .set_occasion(occasion)
        .set_season(season);

    screen.submit(client).await?;

    match screen.view() {
        PredictionView::Ready(dashboard) => {
            print_dashboard(dashboard);
            println!();
            println!("View prediction history: bus-demand history ({HISTORY_ROUTE})");
            Ok(())
        }
        PredictionView::Error { message, back_to } => {
            anyhow::bail!("{} Make a new prediction: bus-demand predict ({})", message, back_to)
        }
        PredictionView::NoPrediction { .. } | PredictionView::Loading => {
            anyhow::bail!("No prediction data available")
        }
    }
}

fn print_dashboard(dashboard: &PredictionDashboard) {
    let result = &dashboard.result;
    let metrics = &dashboard.metrics;

    println!("Route:       {}", result.route.describe());
    println!("Time Period: {}", result.time_period);
    println!("Occasion:    {}", result.occasion);
    println!("Season:      {}", result.season);
    println!();
    println!("Total Predicted Demand: {} tickets", metrics.total_predicted_demand);
    println!("Total Buses Needed:     {} buses", metrics.total_buses_needed);
    println!("Average Demand:         {} tickets per time slot", metrics.average_demand_per_slot);
    println!("Peak Demand:            {} tickets", metrics.peak_demand);
    println!("Average Buses:          {} buses per time slot", metrics.average_buses_per_slot);
    println!();
    println!(
        "{:<12} {:>18} {:>14} {:>12}",
        "Time Slot", "Predicted Demand", "Buses Needed", "Utilization"
    );
    for row in dashboard.rows() {
        println!(
            "{:<12} {:>18} {:>14} {:>12}",
            row.prediction.time_slot,
            format!("{} tickets", row.prediction.predicted_demand),
            format!("{} buses", row.prediction.buses_needed),
            row.utilization.display()
        );
    }
}

async fn run_history(client: &ApiClient, export: Option<PathBuf>) -> Result<()> {
    let mut view = HistoryView::new();
    view.mount(client).await;

    match view.present() {
        HistoryPresentation::Loading => anyhow::bail!("Prediction history did not load"),
        HistoryPresentation::Error { message, back_to } => {
            anyhow::bail!("{} Make a new prediction: bus-demand predict ({})", message, back_to)
        }
        HistoryPresentation::Empty { .. } => {
            println!("No prediction history available.");
            println!("Make some predictions to see them here: bus-demand predict");
        }
        HistoryPresentation::Table(_) => print_history(&view.rows()),
    }

    if let Some(path) = export {
        let written = view.export_csv(&path).await?;
        tracing::info!("Exported {} records to {}", written, path.display());
    }
    Ok(())
}

fn print_history(rows: &[HistoryRow]) {
    println!(
        "{:<20} {:<32} {:<10} {:<14} {:<7} {:>12} {:>12}",
        "Date", "Route", "Period", "Occasion", "Season", "Total Demand", "Buses Needed"
    );
    for row in rows {
        println!(
            "{:<20} {:<32} {:<10} {:<14} {:<7} {:>12} {:>12}",
            row.date,
            row.route,
            row.time_period,
            row.occasion,
            row.season,
            row.total_demand,
            row.buses_needed
        );
    }
}
