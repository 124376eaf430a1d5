use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use timelog::config::Config;
use timelog::core::{
    Date, DateFormat, Duration, EntrySummary, Record, RecordSummary, Rounding, ShouldTotal, Tag,
    Time, TimeFormat,
};
use timelog::error::{AppError, exit_code_of};
use timelog::format::report::{Forecast, render_report, render_today};
use timelog::format::{FormatOptions, Serialiser, json, serialise_records};
use timelog::parser;
use timelog::period::{Period, PeriodKind};
use timelog::query::{self, EntryType, FilterQuery};
use timelog::reconcile::{self, Edit, ReconcileError, Reconciled, RecordParams, Strategy, Styled};
use timelog::storage::{self, FileParser, Loaded, RecordParser, StorageError};
use timelog::warnings;

#[derive(Debug, Parser)]
#[command(
    name = "timelog",
    about = "Plain-text time tracking: evaluate and edit timelog files",
    version
)]
struct Cli {
    /// Enable verbose logging for debugging.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print records in canonical form.
    Print(PrintArgs),

    /// Evaluate the total time of records.
    Total(TotalArgs),

    /// Aggregate total times by tag.
    Tags(TagsArgs),

    /// Totals per day, week, month, quarter or year.
    Report(ReportArgs),

    /// Evaluate the current day next to all other records.
    Today(TodayArgs),

    /// Print records (or syntax errors) as JSON.
    Json(JsonArgs),

    /// Start an open time range.
    Start(StartArgs),

    /// Close the open time range.
    Stop(StopArgs),

    /// Close the open time range and start a new one right away.
    Switch(SwitchArgs),

    /// Add a pause below the open time range, or extend it.
    Pause(PauseArgs),

    /// Append an entry to a record.
    Track(TrackArgs),

    /// Insert a new, empty record.
    Create(CreateArgs),
}

/* ------------------------------ Shared flags ------------------------------ */

#[derive(Debug, Clone, Default, Args)]
struct FilterArgs {
    /// Only records at this date.
    #[arg(long, group = "day")]
    date: Option<Date>,
    /// Only today's records.
    #[arg(long, group = "day")]
    today: bool,
    /// Only yesterday's records.
    #[arg(long, group = "day")]
    yesterday: bool,
    /// Only tomorrow's records.
    #[arg(long, group = "day")]
    tomorrow: bool,
    /// Only records at or after this date.
    #[arg(long)]
    since: Option<Date>,
    /// Only records at or before this date.
    #[arg(long)]
    until: Option<Date>,
    /// Only records after this date.
    #[arg(long, conflicts_with = "since")]
    after: Option<Date>,
    /// Only records before this date.
    #[arg(long, conflicts_with = "until")]
    before: Option<Date>,
    /// Only records in a period: YYYY, YYYY-MM, YYYY-Qn or YYYY-Wnn.
    #[arg(long, group = "span")]
    period: Option<Period>,
    /// Only records of the current week.
    #[arg(long, group = "span")]
    this_week: bool,
    /// Only records of the current month.
    #[arg(long, group = "span")]
    this_month: bool,
    /// Only records of the current quarter.
    #[arg(long, group = "span")]
    this_quarter: bool,
    /// Only records of the current year.
    #[arg(long, group = "span")]
    this_year: bool,
    /// Only records of the previous week.
    #[arg(long, group = "span")]
    last_week: bool,
    /// Only records of the previous month.
    #[arg(long, group = "span")]
    last_month: bool,
    /// Only records of the previous quarter.
    #[arg(long, group = "span")]
    last_quarter: bool,
    /// Only records of the previous year.
    #[arg(long, group = "span")]
    last_year: bool,
    /// Only records or entries with this tag (repeatable, all must match).
    #[arg(long = "tag")]
    tags: Vec<Tag>,
    /// Only entries of this type, e.g. range or duration-negative.
    #[arg(long)]
    entry_type: Option<EntryType>,
}

fn logical(e: impl ToString) -> AppError {
    AppError::Logical(e.to_string())
}

fn shifted(date: Date, days: i64) -> Result<Date, AppError> {
    date.plus_days(days)
        .ok_or_else(|| logical(format!("date {date} shifted by {days} days is out of range")))
}

impl FilterArgs {
    /// The `--this-*` or `--last-*` shortcut, with whether it means the
    /// previous period.
    fn period_shortcut(&self) -> Option<(PeriodKind, bool)> {
        [
            (self.this_week, PeriodKind::Week, false),
            (self.this_month, PeriodKind::Month, false),
            (self.this_quarter, PeriodKind::Quarter, false),
            (self.this_year, PeriodKind::Year, false),
            (self.last_week, PeriodKind::Week, true),
            (self.last_month, PeriodKind::Month, true),
            (self.last_quarter, PeriodKind::Quarter, true),
            (self.last_year, PeriodKind::Year, true),
        ]
        .into_iter()
        .find(|(set, _, _)| *set)
        .map(|(_, kind, previous)| (kind, previous))
    }

    fn query(&self, today: Date) -> Result<FilterQuery, AppError> {
        let at_date = if self.today {
            Some(today)
        } else if self.yesterday {
            Some(shifted(today, -1)?)
        } else if self.tomorrow {
            Some(shifted(today, 1)?)
        } else {
            self.date
        };
        let period = match self.period_shortcut() {
            Some((kind, previous)) => {
                let current = Period::containing(kind, today).map_err(logical)?;
                Some(if previous {
                    current.previous().map_err(logical)?
                } else {
                    current
                })
            }
            None => self.period,
        };
        Ok(FilterQuery {
            at_date,
            since: self.after.map(|d| shifted(d, 1)).transpose()?.or(self.since),
            until: self.before.map(|d| shifted(d, -1)).transpose()?.or(self.until),
            period,
            tags: self.tags.clone(),
            entry_type: self.entry_type,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, Args)]
struct StyleArgs {
    /// Do not colour the output.
    #[arg(long)]
    no_style: bool,
    /// Print durations as minutes.
    #[arg(long)]
    decimal: bool,
}

#[derive(Debug, Clone, Copy, Default, Args)]
struct WarnArgs {
    /// Suppress warnings.
    #[arg(long)]
    no_warn: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Args)]
struct PrintArgs {
    /// Timelog files to read.
    files: Vec<PathBuf>,
    #[command(flatten)]
    filter: FilterArgs,
    /// Sort records by date.
    #[arg(long, value_enum)]
    sort: Option<SortOrder>,
    #[command(flatten)]
    style: StyleArgs,
    #[command(flatten)]
    warn: WarnArgs,
}

#[derive(Debug, Args)]
struct TotalArgs {
    /// Timelog files to read.
    files: Vec<PathBuf>,
    #[command(flatten)]
    filter: FilterArgs,
    /// Also show the should-total and the difference to it.
    #[arg(long)]
    diff: bool,
    /// Count open ranges as if they ended right now.
    #[arg(long)]
    now: bool,
    #[command(flatten)]
    style: StyleArgs,
    #[command(flatten)]
    warn: WarnArgs,
}

#[derive(Debug, Args)]
struct TagsArgs {
    /// Timelog files to read.
    files: Vec<PathBuf>,
    #[command(flatten)]
    filter: FilterArgs,
    /// Break tags down by value.
    #[arg(long)]
    values: bool,
    /// Show the number of matching entries per tag.
    #[arg(long)]
    count: bool,
    #[command(flatten)]
    style: StyleArgs,
    #[command(flatten)]
    warn: WarnArgs,
}

#[derive(Debug, Args)]
struct ReportArgs {
    /// Timelog files to read.
    files: Vec<PathBuf>,
    #[command(flatten)]
    filter: FilterArgs,
    /// Period to sum up by: day, week, month, quarter or year.
    #[arg(long, default_value = "day")]
    aggregate: PeriodKind,
    /// Also list the periods without records in between.
    #[arg(long)]
    fill: bool,
    /// Also show the should-total and the difference to it.
    #[arg(long)]
    diff: bool,
    /// Count open ranges as if they ended right now.
    #[arg(long)]
    now: bool,
    #[command(flatten)]
    style: StyleArgs,
    #[command(flatten)]
    warn: WarnArgs,
}

#[derive(Debug, Args)]
struct TodayArgs {
    /// Timelog files to read.
    files: Vec<PathBuf>,
    /// Also show the should-total and the difference to it.
    #[arg(long)]
    diff: bool,
    /// Count open ranges as if they ended right now; with --diff, also
    /// forecast the end time.
    #[arg(long)]
    now: bool,
    #[command(flatten)]
    style: StyleArgs,
    #[command(flatten)]
    warn: WarnArgs,
}

#[derive(Debug, Args)]
struct JsonArgs {
    /// Timelog files to read.
    files: Vec<PathBuf>,
    #[command(flatten)]
    filter: FilterArgs,
    /// Sort records by date.
    #[arg(long, value_enum)]
    sort: Option<SortOrder>,
    /// Indent the JSON output.
    #[arg(long)]
    pretty: bool,
    #[command(flatten)]
    warn: WarnArgs,
}

#[derive(Debug, Clone, Default, Args)]
struct TargetArgs {
    /// Date of the record; defaults to today.
    #[arg(long, group = "day")]
    date: Option<Date>,
    /// Use yesterday's record.
    #[arg(long, group = "day")]
    yesterday: bool,
    /// Use tomorrow's record.
    #[arg(long, group = "day")]
    tomorrow: bool,
    #[command(flatten)]
    style: StyleArgs,
    #[command(flatten)]
    warn: WarnArgs,
}

impl TargetArgs {
    fn picks_day(&self) -> bool {
        self.date.is_some() || self.yesterday || self.tomorrow
    }
}

#[derive(Debug, Args)]
struct StartArgs {
    /// Timelog file to edit.
    file: Option<PathBuf>,
    #[command(flatten)]
    target: TargetArgs,
    /// Start time; defaults to now.
    #[arg(long)]
    time: Option<Time>,
    /// Round the default time to 5m, 10m, 15m, 30m or 60m.
    #[arg(long)]
    round: Option<Rounding>,
    /// Summary text of the new entry.
    #[arg(long)]
    summary: Option<String>,
}

#[derive(Debug, Args)]
struct StopArgs {
    /// Timelog file to edit.
    file: Option<PathBuf>,
    #[command(flatten)]
    target: TargetArgs,
    /// End time; defaults to now.
    #[arg(long)]
    time: Option<Time>,
    /// Round the default time to 5m, 10m, 15m, 30m or 60m.
    #[arg(long)]
    round: Option<Rounding>,
    /// Text to append to the entry summary.
    #[arg(long)]
    summary: Option<String>,
}

#[derive(Debug, Args)]
struct SwitchArgs {
    /// Timelog file to edit.
    file: Option<PathBuf>,
    #[command(flatten)]
    target: TargetArgs,
    /// Time to stop and start at; defaults to now.
    #[arg(long)]
    time: Option<Time>,
    /// Round the default time to 5m, 10m, 15m, 30m or 60m.
    #[arg(long)]
    round: Option<Rounding>,
    /// Summary text of the new entry.
    #[arg(long)]
    summary: Option<String>,
}

#[derive(Debug, Args)]
struct PauseArgs {
    /// Timelog file to edit.
    file: Option<PathBuf>,
    #[command(flatten)]
    target: TargetArgs,
    /// Length of the pause, e.g. 15m.
    #[arg(long, allow_hyphen_values = true)]
    duration: Duration,
    /// Summary text of the pause entry.
    #[arg(long)]
    summary: Option<String>,
}

#[derive(Debug, Args)]
struct TrackArgs {
    /// The entry as it would be written in the file, e.g. "1h #work".
    #[arg(allow_hyphen_values = true)]
    entry: String,
    /// Timelog file to edit.
    file: Option<PathBuf>,
    #[command(flatten)]
    target: TargetArgs,
    /// Should-total in case a new record is created.
    #[arg(long)]
    should: Option<ShouldTotal>,
}

#[derive(Debug, Args)]
struct CreateArgs {
    /// Timelog file to edit.
    file: Option<PathBuf>,
    #[command(flatten)]
    target: TargetArgs,
    /// Should-total of the new record, e.g. 8h!
    #[arg(long)]
    should: Option<ShouldTotal>,
    /// Summary of the new record; may span several lines.
    #[arg(long)]
    summary: Option<String>,
    /// Create the record even if there is one at that date already.
    #[arg(long)]
    force: bool,
}

/* -------------------------------- Context -------------------------------- */

/// What every command needs besides its arguments.
struct Ctx {
    config: Config,
    now: NaiveDateTime,
    /// Whether the output may be coloured at all.
    colour: bool,
}

impl Ctx {
    fn today(&self) -> Date {
        Date::from_naive(self.now.date())
    }

    fn serialiser(&self, style: &StyleArgs) -> Serialiser {
        Serialiser::new(FormatOptions {
            colour: self.colour && !style.no_style,
            decimal: style.decimal,
        })
    }

    /// The target date. Unless given as `--date`, it follows the file's
    /// style, or the config when that pins a date format.
    fn date(&self, target: &TargetArgs) -> Styled<Date> {
        if let Some(d) = target.date {
            return Styled::explicit(d);
        }
        let offset = if target.yesterday {
            -1
        } else if target.tomorrow {
            1
        } else {
            0
        };
        let day = self.today().plus_days(offset).unwrap_or_else(|| self.today());
        match self.config.date_format {
            Some(style) => Styled::explicit(day.with_format(DateFormat::from(style))),
            None => Styled::auto(day),
        }
    }

    /// The explicit time, or now relative to the record at `date`. Now can
    /// only be expressed on the records of yesterday, today and tomorrow.
    fn time(
        &self,
        explicit: Option<Time>,
        date: Date,
        round: Option<Rounding>,
    ) -> Result<Styled<Time>, AppError> {
        if let Some(t) = explicit {
            return Ok(Styled::explicit(t));
        }
        let mut now = Time::from_naive(self.now.time());
        if let Some(r) = round.or(self.config.default_rounding) {
            now = now.rounded(r);
        }
        let today = self.today();
        let hours = if date == today {
            0
        } else if today.plus_days(-1) == Some(date) {
            24
        } else if today.plus_days(1) == Some(date) {
            -24
        } else {
            return Err(logical(format!(
                "missing time parameter: please specify --time for {date}"
            )));
        };
        let now = now.plus(Duration::new(hours, 0)).map_err(logical)?;
        Ok(match self.config.time_convention {
            Some(c) => Styled::explicit(now.with_format(TimeFormat::from(c))),
            None => Styled::auto(now),
        })
    }

    fn record_params(&self, date: Styled<Date>, should: Option<ShouldTotal>) -> RecordParams {
        RecordParams {
            should_total: should.or(self.config.default_should_total),
            ..RecordParams::new(date)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("Error: cannot set up logging: {e}");
    }
    let result = Config::load()
        .map_err(AppError::from)
        .context("loading config")
        .and_then(|config| {
            let ctx = Ctx {
                colour: config.colour.unwrap_or(true) && io::stdout().is_terminal(),
                config,
                now: Local::now().naive_local(),
            };
            run(cli.command, &ctx, &mut io::stdout().lock())
        });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code_of(&e))
        }
    }
}

fn setup_logging(verbose: bool) -> Result<(), log::SetLoggerError> {
    let colors = fern::colors::ColoredLevelConfig::new();
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .chain(io::stderr())
        .apply()
}

fn run(command: Commands, ctx: &Ctx, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Print(args) => handle_print(args, ctx, out),
        Commands::Total(args) => handle_total(args, ctx, out),
        Commands::Tags(args) => handle_tags(args, ctx, out),
        Commands::Report(args) => handle_report(args, ctx, out),
        Commands::Today(args) => handle_today(args, ctx, out),
        Commands::Json(args) => handle_json(args, ctx, out),
        Commands::Start(args) => handle_start(args, ctx, out),
        Commands::Stop(args) => handle_stop(args, ctx, out),
        Commands::Switch(args) => handle_switch(args, ctx, out),
        Commands::Pause(args) => handle_pause(args, ctx, out),
        Commands::Track(args) => handle_track(args, ctx, out),
        Commands::Create(args) => handle_create(args, ctx, out),
    }
}

/* ---------------------------- Input and output ---------------------------- */

/// Syntax errors go to stderr right away; the returned error only summarises.
fn report(errors: Vec<StorageError>, serialiser: &Serialiser) -> AppError {
    for e in &errors {
        if let StorageError::Syntax { path, errors } = e {
            eprint!("{}", serialiser.parse_errors(errors, Some(path)));
        }
    }
    AppError::Files(errors)
}

fn read_records(files: &[PathBuf], serialiser: &Serialiser) -> Result<Vec<Record>> {
    if files.is_empty() {
        return Err(AppError::NoInput.into());
    }
    let loaded = storage::parse_files(&FileParser, files).map_err(|e| report(e, serialiser))?;
    Ok(loaded
        .into_iter()
        .flat_map(|l| l.parsed.records)
        .collect())
}

fn apply_sort(records: Vec<Record>, sort: Option<SortOrder>) -> Vec<Record> {
    match sort {
        Some(SortOrder::Asc) => query::sort(&records, true),
        Some(SortOrder::Desc) => query::sort(&records, false),
        None => records,
    }
}

fn print_warnings(
    out: &mut dyn Write,
    ctx: &Ctx,
    serialiser: &Serialiser,
    warn: &WarnArgs,
    records: &[Record],
) -> Result<()> {
    if warn.no_warn {
        return Ok(());
    }
    let found = warnings::check(ctx.now, records, &ctx.config.disabled_checkers());
    if !found.is_empty() {
        writeln!(out)?;
    }
    for w in found {
        writeln!(out, "{}", serialiser.warning(&w.date, w.message()))?;
    }
    Ok(())
}

/* ------------------------------- Evaluation ------------------------------- */

fn handle_print(args: PrintArgs, ctx: &Ctx, out: &mut dyn Write) -> Result<()> {
    let serialiser = ctx.serialiser(&args.style);
    let records = read_records(&args.files, &serialiser)?;
    let records = query::filter(&records, &args.filter.query(ctx.today())?);
    let records = apply_sort(records, args.sort);
    write!(out, "{}", serialise_records(&serialiser, &records))?;
    print_warnings(out, ctx, &serialiser, &args.warn, &records)
}

fn handle_total(args: TotalArgs, ctx: &Ctx, out: &mut dyn Write) -> Result<()> {
    let serialiser = ctx.serialiser(&args.style);
    let records = read_records(&args.files, &serialiser)?;
    let records = query::filter(&records, &args.filter.query(ctx.today())?);
    let total = if args.now {
        query::hypothetical_total(ctx.now, &records)
    } else {
        query::total(&records)
    };
    writeln!(out, "Total: {}", serialiser.duration(total))?;
    if args.diff {
        let should = ShouldTotal::new(query::should_total_sum(&records))
            .context("summing should-totals")?;
        writeln!(out, "Should: {}", serialiser.should_total(&should))?;
        writeln!(out, "Diff: {}", serialiser.signed_duration(should.diff(total)))?;
    }
    let plural = if records.len() == 1 { "" } else { "s" };
    writeln!(out, "(In {} record{plural})", records.len())?;
    print_warnings(out, ctx, &serialiser, &args.warn, &records)
}

fn handle_tags(args: TagsArgs, ctx: &Ctx, out: &mut dyn Write) -> Result<()> {
    let serialiser = ctx.serialiser(&args.style);
    let records = read_records(&args.files, &serialiser)?;
    let records = query::filter(&records, &args.filter.query(ctx.today())?);
    let stats = query::aggregate_totals_by_tags(&records);
    let rows: Vec<(String, &query::TagStats)> = stats
        .iter()
        .filter_map(|s| match s.tag.value() {
            None => Some((format!("#{}", s.tag.name()), s)),
            Some(value) if args.values => Some((format!("  {value}"), s)),
            Some(_) => None,
        })
        .collect();
    let width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    for (label, s) in rows {
        let mut line = format!("{label:<width$}  {}", serialiser.duration(s.total));
        if args.count {
            line.push_str(&format!(" ({})", s.count));
        }
        writeln!(out, "{line}")?;
    }
    print_warnings(out, ctx, &serialiser, &args.warn, &records)
}

fn handle_report(args: ReportArgs, ctx: &Ctx, out: &mut dyn Write) -> Result<()> {
    let serialiser = ctx.serialiser(&args.style);
    let records = read_records(&args.files, &serialiser)?;
    let records = query::filter(&records, &args.filter.query(ctx.today())?);
    let evaluated = if args.now {
        query::close_open_ranges(ctx.now, &records).0
    } else {
        records.clone()
    };
    let groups =
        query::group_by_period(&evaluated, args.aggregate, args.fill).map_err(logical)?;
    let table = render_report(&serialiser, &groups, args.aggregate, args.diff);
    write!(out, "{table}")?;
    print_warnings(out, ctx, &serialiser, &args.warn, &records)
}

fn handle_today(args: TodayArgs, ctx: &Ctx, out: &mut dyn Write) -> Result<()> {
    let serialiser = ctx.serialiser(&args.style);
    let records = read_records(&args.files, &serialiser)?;
    let (evaluated, closed_open_range) = if args.now {
        query::close_open_ranges(ctx.now, &records)
    } else {
        (records.clone(), false)
    };
    let split = query::split_current(ctx.today(), &evaluated);
    let forecast = args.now.then(|| Forecast {
        now: Time::from_naive(ctx.now.time()),
        closed_open_range,
    });
    write!(out, "{}", render_today(&serialiser, &split, args.diff, forecast))?;
    print_warnings(out, ctx, &serialiser, &args.warn, &records)
}

fn handle_json(args: JsonArgs, ctx: &Ctx, out: &mut dyn Write) -> Result<()> {
    if args.files.is_empty() {
        return Err(AppError::NoInput.into());
    }
    let loaded = match storage::parse_files(&FileParser, &args.files) {
        Ok(loaded) => loaded,
        Err(errors) => {
            let syntax = errors
                .iter()
                .filter_map(|e| match e {
                    StorageError::Syntax { path, errors } => Some((path, errors)),
                    _ => None,
                })
                .flat_map(|(path, errs)| errs.iter().map(move |e| (Some(path.as_path()), e)));
            writeln!(out, "{}", json::errors_to_json(syntax, args.pretty)?)?;
            return Err(AppError::Files(errors).into());
        }
    };
    let records: Vec<Record> = loaded.into_iter().flat_map(|l| l.parsed.records).collect();
    let records = query::filter(&records, &args.filter.query(ctx.today())?);
    let records = apply_sort(records, args.sort);
    let found = if args.warn.no_warn {
        Vec::new()
    } else {
        warnings::check(ctx.now, &records, &ctx.config.disabled_checkers())
            .iter()
            .map(ToString::to_string)
            .collect()
    };
    writeln!(out, "{}", json::records_to_json(&records, found, args.pretty)?)?;
    Ok(())
}

/* ------------------------------- Mutations ------------------------------- */

fn load_target(file: Option<&Path>, serialiser: &Serialiser) -> Result<Loaded> {
    let path = file.ok_or(AppError::NoTargetFile)?;
    FileParser
        .parse_file(path)
        .map_err(|e| anyhow::Error::from(report(vec![e], serialiser)))
}

/// Reconciles the target file with each edit in turn and writes it back once.
/// Nothing is written when any edit cannot be applied.
fn edit_file(
    file: Option<&Path>,
    target: &TargetArgs,
    ctx: &Ctx,
    strategies: &[Strategy],
    edits: &[Edit],
    out: &mut dyn Write,
) -> Result<()> {
    let serialiser = ctx.serialiser(&target.style);
    let loaded = load_target(file, &serialiser)?;
    let mut parsed = loaded.parsed;
    let mut reconciled: Option<Reconciled> = None;
    for edit in edits {
        if let Some(previous) = &reconciled {
            parsed = parser::parse(&previous.text)
                .map_err(|e| AppError::from(ReconcileError::InvalidResult(e)))?;
        }
        let result = reconcile::reconcile(&parsed, strategies, edit)
            .map_err(AppError::from)
            .with_context(|| format!("editing {:?}", loaded.path))?;
        reconciled = Some(result);
    }
    let Some(result) = reconciled else {
        return Ok(());
    };
    storage::write_file(&loaded.path, &result.text).map_err(AppError::from)?;
    let record = std::slice::from_ref(&result.record);
    write!(out, "{}", serialise_records(&serialiser, record))?;
    print_warnings(out, ctx, &serialiser, &target.warn, &result.records)
}

fn summary_of(text: Option<&str>) -> EntrySummary {
    text.map(EntrySummary::from_line).unwrap_or_default()
}

fn handle_start(args: StartArgs, ctx: &Ctx, out: &mut dyn Write) -> Result<()> {
    let date = ctx.date(&args.target);
    let edit = Edit::StartOpenRange {
        start: ctx.time(args.time, date.value, args.round)?,
        summary: summary_of(args.summary.as_deref()),
    };
    let strategies = [
        Strategy::ExistingRecord(date.value),
        Strategy::NewRecord(ctx.record_params(date, None)),
    ];
    edit_file(args.file.as_deref(), &args.target, ctx, &strategies, &[edit], out)
}

fn handle_stop(args: StopArgs, ctx: &Ctx, out: &mut dyn Write) -> Result<()> {
    let date = ctx.date(&args.target);
    let mut strategies = vec![Strategy::ExistingRecord(date.value)];
    // Ranges started yesterday may be closed today, as a `>` time.
    if !args.target.picks_day() {
        if let Some(yesterday) = date.value.plus_days(-1) {
            strategies.push(Strategy::ExistingRecord(yesterday));
        }
    }
    let edit = Edit::CloseOpenRange {
        at: ctx.time(args.time, date.value, args.round)?,
        on: date.value,
        summary: summary_of(args.summary.as_deref()),
    };
    edit_file(args.file.as_deref(), &args.target, ctx, &strategies, &[edit], out)
}

fn handle_switch(args: SwitchArgs, ctx: &Ctx, out: &mut dyn Write) -> Result<()> {
    let date = ctx.date(&args.target);
    let at = ctx.time(args.time, date.value, args.round)?;
    let edits = [
        Edit::CloseOpenRange {
            at,
            on: date.value,
            summary: EntrySummary::default(),
        },
        Edit::StartOpenRange {
            start: at,
            summary: summary_of(args.summary.as_deref()),
        },
    ];
    let strategies = [Strategy::ExistingRecord(date.value)];
    edit_file(args.file.as_deref(), &args.target, ctx, &strategies, &edits, out)
}

fn handle_pause(args: PauseArgs, ctx: &Ctx, out: &mut dyn Write) -> Result<()> {
    let date = ctx.date(&args.target);
    let mut strategies = vec![Strategy::ExistingRecord(date.value)];
    if !args.target.picks_day() {
        if let Some(yesterday) = date.value.plus_days(-1) {
            strategies.push(Strategy::ExistingRecord(yesterday));
        }
    }
    let edit = Edit::Pause {
        duration: Duration::from_minutes(args.duration.in_minutes().abs()),
        summary: summary_of(args.summary.as_deref()),
    };
    edit_file(args.file.as_deref(), &args.target, ctx, &strategies, &[edit], out)
}

fn handle_track(args: TrackArgs, ctx: &Ctx, out: &mut dyn Write) -> Result<()> {
    let entry = parser::parse_entry(&args.entry)
        .map_err(|e| AppError::Logical(format!("invalid entry {:?}: {e}", args.entry)))?;
    let date = ctx.date(&args.target);
    let strategies = [
        Strategy::ExistingRecord(date.value),
        Strategy::NewRecord(ctx.record_params(date, args.should)),
    ];
    edit_file(
        args.file.as_deref(),
        &args.target,
        ctx,
        &strategies,
        &[Edit::append(entry)],
        out,
    )
}

fn handle_create(args: CreateArgs, ctx: &Ctx, out: &mut dyn Write) -> Result<()> {
    let lines: Vec<String> = args
        .summary
        .as_deref()
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default();
    let summary = RecordSummary::new(lines)
        .map_err(|e| AppError::Logical(format!("invalid summary: {e}")))?;
    let params = RecordParams {
        summary,
        ..ctx.record_params(ctx.date(&args.target), args.should)
    };
    let strategy = if args.force {
        Strategy::NewRecordRegardless(params)
    } else {
        Strategy::NewRecord(params)
    };
    edit_file(
        args.file.as_deref(),
        &args.target,
        ctx,
        &[strategy],
        &[Edit::CreateRecord],
        out,
    )
}
