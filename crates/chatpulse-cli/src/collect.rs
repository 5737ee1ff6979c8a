//! `collect` and `classify` command handlers.
//!
//! Command-line flags override the env-driven [`AppConfig`]; the merged
//! result is a [`CollectPlan`] that decides which source and classifier
//! to build.

use std::path::PathBuf;
use std::time::Duration;

use chatpulse_core::{AppConfig, ClassifierKind};
use chatpulse_sentiment::{
    run_collection, Classifier, ClassifierError, CollectionSettings, FileSource, HttpClassifier,
    HttpFeedSource, LexiconClassifier, Record, Sentiment, Source, SourceError, SourceItem,
    StopReason,
};
use clap::{Args, ValueEnum};

use crate::report;

/// Flags for `chatpulse collect`.
#[derive(Debug, Args)]
pub(crate) struct CollectArgs {
    /// HTTP JSON chat feed to poll (overrides `CHATPULSE_SOURCE_URL`)
    #[arg(long, conflicts_with = "file")]
    pub url: Option<String>,

    /// Append-only chat transcript to poll (overrides `CHATPULSE_SOURCE_FILE`)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Collection window in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub window_secs: Option<u64>,

    /// Seconds between poll cycles
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: Option<u64>,

    /// Classifier backend
    #[arg(long, value_enum)]
    pub classifier: Option<ClassifierArg>,

    /// Text-classification endpoint for the `http` classifier
    #[arg(long)]
    pub classifier_url: Option<String>,

    /// Classifications allowed in flight per poll cycle
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: Option<u64>,

    /// Directory for the JSON export and markdown report
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Skip writing the report; console output only
    #[arg(long)]
    pub no_report: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ClassifierArg {
    Lexicon,
    Http,
}

impl From<ClassifierArg> for ClassifierKind {
    fn from(arg: ClassifierArg) -> Self {
        match arg {
            ClassifierArg::Lexicon => ClassifierKind::Lexicon,
            ClassifierArg::Http => ClassifierKind::Http,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SourceSpec {
    Url(String),
    File(PathBuf),
}

impl std::fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceSpec::Url(url) => write!(f, "{url}"),
            SourceSpec::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fully resolved inputs for one collection run.
#[derive(Debug, Clone)]
pub(crate) struct CollectPlan {
    pub source: SourceSpec,
    pub classifier: ClassifierKind,
    pub classifier_url: Option<String>,
    pub settings: CollectionSettings,
    pub output_dir: Option<PathBuf>,
}

/// Merge command-line flags over the env config.
///
/// # Errors
///
/// Returns an error if no source is configured, or the `http` classifier is
/// selected without an endpoint.
pub(crate) fn resolve_plan(config: &AppConfig, args: &CollectArgs) -> anyhow::Result<CollectPlan> {
    let source = match (&args.url, &args.file) {
        (Some(url), _) => SourceSpec::Url(url.clone()),
        (None, Some(path)) => SourceSpec::File(path.clone()),
        (None, None) => match (&config.source_url, &config.source_file) {
            (Some(url), _) => SourceSpec::Url(url.clone()),
            (None, Some(path)) => SourceSpec::File(path.clone()),
            (None, None) => anyhow::bail!(
                "no chat source configured; pass --url or --file, or set CHATPULSE_SOURCE_URL / CHATPULSE_SOURCE_FILE"
            ),
        },
    };

    let classifier = args
        .classifier
        .map_or(config.classifier, ClassifierKind::from);
    let classifier_url = args
        .classifier_url
        .clone()
        .or_else(|| config.classifier_url.clone());
    if classifier == ClassifierKind::Http && classifier_url.is_none() {
        anyhow::bail!(
            "the http classifier needs an endpoint; pass --classifier-url or set CHATPULSE_CLASSIFIER_URL"
        );
    }

    let classify_concurrency = match args.concurrency {
        Some(n) => usize::try_from(n)?,
        None => config.classify_concurrency,
    };

    let settings = CollectionSettings {
        window: Duration::from_secs(args.window_secs.unwrap_or(config.window_secs)),
        interval: Duration::from_secs(args.interval_secs.unwrap_or(config.poll_interval_secs)),
        classify_concurrency,
        connect_max_retries: config.connect_max_retries,
        connect_backoff_base_ms: config.connect_backoff_base_ms,
    };

    let output_dir = if args.no_report {
        None
    } else {
        Some(
            args.output_dir
                .clone()
                .unwrap_or_else(|| config.output_dir.clone()),
        )
    };

    Ok(CollectPlan {
        source,
        classifier,
        classifier_url,
        settings,
        output_dir,
    })
}

/// The concrete source selected at run time.
enum FeedSource {
    Http(HttpFeedSource),
    File(FileSource),
}

impl Source for FeedSource {
    async fn connect(&mut self) -> Result<(), SourceError> {
        match self {
            FeedSource::Http(source) => source.connect().await,
            FeedSource::File(source) => source.connect().await,
        }
    }

    async fn current_messages(&mut self) -> Result<Vec<SourceItem>, SourceError> {
        match self {
            FeedSource::Http(source) => source.current_messages().await,
            FeedSource::File(source) => source.current_messages().await,
        }
    }

    async fn close(&mut self) {
        match self {
            FeedSource::Http(source) => source.close().await,
            FeedSource::File(source) => source.close().await,
        }
    }
}

/// The concrete classifier selected at run time.
enum ChatClassifier {
    Lexicon(LexiconClassifier),
    Http(HttpClassifier),
}

impl Classifier for ChatClassifier {
    async fn classify(&self, text: &str) -> Result<String, ClassifierError> {
        match self {
            ChatClassifier::Lexicon(classifier) => classifier.classify(text).await,
            ChatClassifier::Http(classifier) => classifier.classify(text).await,
        }
    }
}

fn build_source(spec: &SourceSpec, config: &AppConfig) -> anyhow::Result<FeedSource> {
    Ok(match spec {
        SourceSpec::Url(url) => FeedSource::Http(
            HttpFeedSource::new(url, config.request_timeout_secs, &config.user_agent)
                .map_err(|e| anyhow::anyhow!("failed to build chat feed client: {e}"))?,
        ),
        SourceSpec::File(path) => FeedSource::File(FileSource::new(path)),
    })
}

fn build_classifier(
    kind: ClassifierKind,
    url: Option<&str>,
    config: &AppConfig,
) -> anyhow::Result<ChatClassifier> {
    Ok(match (kind, url) {
        (ClassifierKind::Lexicon, _) => ChatClassifier::Lexicon(LexiconClassifier),
        (ClassifierKind::Http, Some(url)) => ChatClassifier::Http(
            HttpClassifier::new(
                url,
                config.classifier_token.clone(),
                config.request_timeout_secs,
                &config.user_agent,
            )
            .map_err(|e| anyhow::anyhow!("failed to build classifier client: {e}"))?,
        ),
        (ClassifierKind::Http, None) => {
            anyhow::bail!("the http classifier needs CHATPULSE_CLASSIFIER_URL")
        }
    })
}

/// One console progress line per recorded message.
pub(crate) fn progress_line(record: &Record) -> String {
    format!(
        "Time: {}, Content: {}, Sentiment: {}",
        record.timestamp(),
        record.content(),
        record.sentiment()
    )
}

/// Run one collection window and write the report.
///
/// # Errors
///
/// Returns an error if the plan cannot be resolved, the source is
/// unavailable, or the report cannot be written.
pub(crate) async fn run_collect(config: &AppConfig, args: &CollectArgs) -> anyhow::Result<()> {
    let plan = resolve_plan(config, args)?;
    let mut source = build_source(&plan.source, config)?;
    let classifier = build_classifier(plan.classifier, plan.classifier_url.as_deref(), config)?;

    tracing::info!(
        source = %plan.source,
        classifier = %plan.classifier,
        window_secs = plan.settings.window.as_secs(),
        interval_secs = plan.settings.interval.as_secs(),
        "starting live chat collection"
    );

    let outcome = run_collection(
        &mut source,
        &classifier,
        &plan.settings,
        crate::shutdown_signal(),
        |record| println!("{}", progress_line(record)),
    )
    .await?;

    match outcome.stop {
        StopReason::WindowElapsed => println!(
            "{} seconds have passed. Stopping data extraction.",
            plan.settings.window.as_secs()
        ),
        StopReason::Interrupted => println!("Interrupted. Stopping data extraction."),
    }
    println!("Total responses collected: {}", outcome.log.len());

    if let Some(dir) = &plan.output_dir {
        let paths = report::write_report(
            dir,
            &outcome.log,
            &outcome.aggregate,
            chrono::Local::now(),
        )?;
        println!("Chat data exported: {}", paths.data.display());
        println!("Report generated: {}", paths.summary.display());
    }

    Ok(())
}

/// Classify one message and print the raw label and mapped sentiment.
///
/// # Errors
///
/// Returns an error if the classifier cannot be built or fails.
pub(crate) async fn run_classify(config: &AppConfig, text: &str) -> anyhow::Result<()> {
    let classifier = build_classifier(config.classifier, config.classifier_url.as_deref(), config)?;
    let raw = classifier.classify(text).await?;
    println!("{raw} -> {}", Sentiment::from_raw_label(&raw));
    Ok(())
}
