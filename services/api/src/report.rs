//! One-shot `analyze` command: import CSVs into a scratch in-memory store, analyze a single
//! provider and print a plain-text (or JSON) report.

use clap::Args;
use fmv_core::config::AppConfig;
use fmv_core::error::AppError;
use fmv_core::fmv::percentile::PercentileStrategy;
use fmv_core::fmv::risk::RiskAssessmentInput;
use fmv_core::fmv::service::{FmvService, ProviderAnalysis};
use fmv_core::fmv::storage::InMemoryStore;
use std::fmt::Write as _;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Market survey CSV (specialty plus p25..p90 total, wRVU and CF columns)
    #[arg(long)]
    pub(crate) market_csv: PathBuf,
    /// Employee compensation CSV
    #[arg(long)]
    pub(crate) employee_csv: PathBuf,
    /// Employee id of the provider to analyze
    #[arg(long)]
    pub(crate) provider: String,
    /// JSON file with the reviewer's risk assessment inputs
    #[arg(long)]
    pub(crate) assessment: Option<PathBuf>,
    /// Percentile strategy: interpolated (default) or rank
    #[arg(long, value_parser = crate::infra::parse_strategy)]
    pub(crate) strategy: Option<PercentileStrategy>,
    /// Print the full analysis as JSON instead of the text report
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_analysis(args: AnalyzeArgs) -> Result<(), AppError> {
    let strategy = match args.strategy {
        Some(strategy) => strategy,
        None => AppConfig::load()?.analysis.percentile_strategy,
    };

    let assessment = match &args.assessment {
        Some(path) => serde_json::from_reader(File::open(path)?)?,
        None => RiskAssessmentInput::default(),
    };

    let service = FmvService::new(Arc::new(InMemoryStore::default()), strategy);
    service.import_market_data(File::open(&args.market_csv)?)?;
    service.import_employee_data(File::open(&args.employee_csv)?)?;
    let analysis = service.analyze_provider(&args.provider, assessment)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", render_report(&analysis));
    }
    Ok(())
}

pub(crate) fn render_report(analysis: &ProviderAnalysis) -> String {
    let mut output = String::new();
    let compensation = &analysis.compensation;
    let risk = &analysis.risk;

    let _ = writeln!(
        output,
        "FMV analysis for {} ({}), {}",
        analysis.full_name, analysis.provider_id, analysis.specialty
    );
    let _ = writeln!(
        output,
        "Generated {} using {} percentiles",
        analysis.generated_at.format("%Y-%m-%d %H:%M UTC"),
        analysis.strategy.label()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Compensation");
    let _ = writeln!(output, "  Total cash:        {}", currency(compensation.total));
    let _ = writeln!(
        output,
        "  Base / productivity / call / admin / quality: {} / {} / {} / {} / {}",
        currency(compensation.components.base_total),
        currency(compensation.components.productivity_total),
        currency(compensation.components.call_total),
        currency(compensation.components.admin_total),
        currency(compensation.components.quality_total)
    );
    let _ = writeln!(output, "  Annual wRVUs:      {:.0}", analysis.annual_wrvus);
    let _ = writeln!(output, "  Per wRVU:          {}", currency(compensation.per_unit));
    let _ = writeln!(output);
    let _ = writeln!(output, "Percentiles");
    let _ = writeln!(output, "  TCC:               {:.1}", analysis.percentiles.tcc);
    let _ = writeln!(output, "  wRVU:              {:.1}", analysis.percentiles.wrvu);
    let _ = writeln!(
        output,
        "  Conversion factor: {:.1}",
        analysis.percentiles.conversion_factor
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Risk: {} ({} severity), {} of {} points",
        risk.overall_risk.label(),
        risk.severity.label(),
        risk.total_score,
        risk.metrics.max_possible_score
    );
    for factor in &risk.factors {
        let _ = writeln!(
            output,
            "  [{}] {:<28} {} pt",
            factor.risk_level.label(),
            factor.category,
            factor.score
        );
        for finding in &factor.findings {
            let _ = writeln!(output, "      - {finding}");
        }
        for recommendation in &factor.recommendations {
            let _ = writeln!(output, "      > {recommendation}");
        }
    }

    if !risk.contextual_factors.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Context");
        for note in &risk.contextual_factors {
            let _ = writeln!(output, "  * {note}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "{}", risk.summary);
    output
}

fn currency(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let (whole, fraction) = (cents / 100, (cents % 100).abs());
    let digits = whole.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if whole < 0 { "-" } else { "" };
    format!("{sign}${grouped}.{fraction:02}")
}
