//! Command line front end
//!
//! `doctype info|list|get|delete` talk to a backend; `doctype form` renders a
//! descriptor file offline and prints the control blueprint together with
//! the validation report. `doctype prefs` reads or sets the persisted
//! sales/purchase/legal selector.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use doctype_client::{
    ClientConfig, DoctypeApi, HttpDoctypeClient, Preferences, SalesPurchaseType, SALES_PURCHASE_TYPE_KEY,
};
use doctype_form::{
    DynamicForm, FieldRenderer, FormOptions, FormState, RenderOptions, RenderedField, SchemaBuilder,
    ValidationReport,
};
use doctype_meta::{validate_descriptors, DoctypeInfo, FieldDescriptor, Filter, ListQuery, Record};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line definition
#[must_use]
pub fn cli() -> Command {
    Command::new("doctype")
        .version(VERSION)
        .about("Inspect doctype backends and render doctype forms")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .env("DOCTYPE_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the client TOML config"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .global(true)
                .help("Backend origin, overrides config and DOCTYPE_HOST"),
        )
        .subcommand(
            Command::new("info")
                .about("Show the field descriptors of a doctype")
                .arg(Arg::new("doctype").required(true))
                .arg(fields_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("List records of a doctype")
                .arg(Arg::new("doctype").required(true))
                .arg(fields_arg())
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .short('f')
                        .action(ArgAction::Append)
                        .value_parser(parse_filter)
                        .help("Condition such as 'status=Open', 'status!=Lost' or 'status in Open,Replied'"),
                )
                .arg(
                    Arg::new("or-filter")
                        .long("or-filter")
                        .action(ArgAction::Append)
                        .value_parser(parse_filter)
                        .help("Condition ORed with the other --or-filter conditions"),
                )
                .arg(
                    Arg::new("page")
                        .long("page")
                        .default_value("1")
                        .value_parser(value_parser!(u32))
                        .help("1-based page number"),
                )
                .arg(
                    Arg::new("page-length")
                        .long("page-length")
                        .value_parser(value_parser!(u32))
                        .help("Rows per page (defaults to the configured page length)"),
                )
                .arg(
                    Arg::new("order-by")
                        .long("order-by")
                        .default_value(doctype_meta::DEFAULT_ORDER_BY)
                        .help("Ordering clause"),
                ),
        )
        .subcommand(
            Command::new("get")
                .about("Fetch one record")
                .arg(Arg::new("doctype").required(true))
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete records by id")
                .arg(Arg::new("doctype").required(true))
                .arg(Arg::new("ids").required(true).num_args(1..)),
        )
        .subcommand(
            Command::new("prefs")
                .about("Show or set the sales/purchase/legal selector")
                .arg(
                    Arg::new("set")
                        .long("set")
                        .value_parser(parse_sales_purchase_type)
                        .help("sales, purchase or legal"),
                ),
        )
        .subcommand(
            Command::new("form")
                .about("Render a descriptor file offline and validate a record")
                .arg(
                    Arg::new("descriptors")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file: a descriptor list or a list_info payload"),
                )
                .arg(
                    Arg::new("record")
                        .long("record")
                        .short('r')
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file with the record to populate the form"),
                )
                .arg(fields_arg())
                .arg(
                    Arg::new("date-offset")
                        .long("date-offset")
                        .default_value("1")
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(i64))
                        .help("Days added to picked dates"),
                ),
        )
}

fn fields_arg() -> Arg {
    Arg::new("fields")
        .long("fields")
        .value_delimiter(',')
        .action(ArgAction::Append)
        .help("Comma separated fieldnames")
}

fn parse_filter(expr: &str) -> Result<Filter, String> {
    Filter::parse_expr(expr).map_err(|e| e.to_string())
}

fn parse_sales_purchase_type(value: &str) -> Result<SalesPurchaseType, String> {
    value.parse().map_err(|e: doctype_client::ClientError| e.to_string())
}

fn fields_of(args: &ArgMatches) -> Vec<String> {
    args.get_many::<String>("fields")
        .map(|values| values.filter(|v| !v.is_empty()).cloned().collect())
        .unwrap_or_default()
}

/// Execute the parsed command line, returning what to print
///
/// # Errors
/// Configuration, file, backend and decoding failures, with context.
pub async fn run(matches: &ArgMatches) -> anyhow::Result<String> {
    let output = match matches.subcommand() {
        Some(("form", args)) => {
            let descriptors = path_arg(args, "descriptors")?;
            let report = form_report(
                descriptors,
                args.get_one::<PathBuf>("record").map(PathBuf::as_path),
                &fields_of(args),
                args.get_one::<i64>("date-offset").copied().unwrap_or(1),
            )?;
            serde_json::to_value(report)?
        }
        Some(("prefs", args)) => {
            let config = client_config(matches)?;
            preferences(&config, args.get_one::<SalesPurchaseType>("set").copied())?
        }
        Some((name, args)) => {
            let config = client_config(matches)?;
            let api = HttpDoctypeClient::new(&config)?;
            execute(&api, &config, name, args).await?
        }
        None => bail!("no command given"),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a Path> {
    args.get_one::<PathBuf>(name)
        .map(PathBuf::as_path)
        .with_context(|| format!("missing {name}"))
}

/// Client configuration from `--config`, the environment and `--host`
///
/// # Errors
/// When the config file cannot be loaded or the result is invalid.
pub fn client_config(matches: &ArgMatches) -> anyhow::Result<ClientConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ClientConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => {
            let mut config = ClientConfig::default();
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
    };
    if let Some(host) = matches.get_one::<String>("host") {
        config.host.clone_from(host);
    }
    config.validate()?;
    Ok(config)
}

/// Run a backend command against any [`DoctypeApi`]
///
/// # Errors
/// Backend failures, or an unknown command name.
pub async fn execute<A: DoctypeApi>(
    api: &A,
    config: &ClientConfig,
    name: &str,
    args: &ArgMatches,
) -> anyhow::Result<JsonValue> {
    let doctype = args
        .get_one::<String>("doctype")
        .context("missing doctype")?;

    let output = match name {
        "info" => {
            let info = api.list_info(doctype, &fields_of(args)).await?;
            serde_json::to_value(info)?
        }
        "list" => {
            let mut query = ListQuery::new(doctype.as_str())
                .with_fields(fields_of(args))
                .page(args.get_one::<u32>("page").copied().unwrap_or(1))
                .page_length(
                    args.get_one::<u32>("page-length")
                        .copied()
                        .unwrap_or(config.page_length),
                );
            if let Some(order_by) = args.get_one::<String>("order-by") {
                query = query.order_by(order_by.as_str());
            }
            for filter in args.get_many::<Filter>("filter").into_iter().flatten() {
                query = query.filter(filter.clone());
            }
            for filter in args.get_many::<Filter>("or-filter").into_iter().flatten() {
                query = query.or_filter(filter.clone());
            }
            let page = api.list_data(&query).await?;
            json!({
                "page": query.page,
                "pages": page.page_count(query.page_length),
                "total": page.total,
                "rows": page.rows,
            })
        }
        "get" => {
            let id = args.get_one::<String>("id").context("missing id")?;
            let record = api.single_data(doctype, id).await?;
            if record.is_empty() {
                bail!("{doctype} {id} not found");
            }
            record.into_json()
        }
        "delete" => {
            let ids: Vec<String> = args
                .get_many::<String>("ids")
                .map(|ids| ids.cloned().collect())
                .unwrap_or_default();
            api.delete(doctype, &ids).await?;
            json!({ "deleted": ids })
        }
        other => bail!("unknown command '{other}'"),
    };
    tracing::debug!("{} {} done", name, doctype);
    Ok(output)
}

/// Read the configured preferences, optionally selecting a new view first
///
/// # Errors
/// When the preferences file cannot be read or written.
pub fn preferences(config: &ClientConfig, set: Option<SalesPurchaseType>) -> anyhow::Result<JsonValue> {
    let mut prefs = Preferences::from_config(config).context("loading preferences")?;
    if let Some(kind) = set {
        if prefs.path().is_none() {
            tracing::warn!("no preferences_path configured, {} is not persisted", SALES_PURCHASE_TYPE_KEY);
        }
        prefs.set_sales_purchase_type(kind);
        prefs.save().context("saving preferences")?;
    }
    let mut output = json!({ "path": prefs.path().map(|p| p.display().to_string()) });
    output[SALES_PURCHASE_TYPE_KEY] = json!(prefs.sales_purchase_type().as_str());
    Ok(output)
}

/// Descriptor file contents: a bare list, a `list_info` payload or its envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DescriptorFile {
    List(Vec<FieldDescriptor>),
    Envelope { data: DoctypeInfo },
    Info(DoctypeInfo),
}

impl DescriptorFile {
    fn into_fields(self) -> Vec<FieldDescriptor> {
        match self {
            Self::List(fields) => fields,
            Self::Info(info) | Self::Envelope { data: info } => info.fields,
        }
    }
}

/// Result of rendering a form offline
#[derive(Debug, Clone, Serialize)]
pub struct FormReport {
    /// Rendered controls in request order
    pub fields: Vec<RenderedField>,
    /// Whether the record passes validation
    pub valid: bool,
    /// Errors and warnings per field
    pub report: ValidationReport,
}

/// Render and validate a descriptor file, optionally populated from a record file
///
/// # Errors
/// When a file cannot be read or parsed, or the descriptors are inconsistent.
pub fn form_report(
    descriptors: &Path,
    record: Option<&Path>,
    requested: &[String],
    date_offset: i64,
) -> anyhow::Result<FormReport> {
    let text = std::fs::read_to_string(descriptors)
        .with_context(|| format!("reading {}", descriptors.display()))?;
    let fields = serde_json::from_str::<DescriptorFile>(&text)
        .with_context(|| format!("parsing descriptors in {}", descriptors.display()))?
        .into_fields();
    validate_descriptors(&fields)?;

    let mut state = match record {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            let record: Record =
                serde_json::from_str(&text).with_context(|| format!("parsing record in {}", path.display()))?;
            FormState::from_record(&fields, &record)
        }
        None => FormState::new(&fields),
    };

    let schema = SchemaBuilder::new().build(Some(fields.as_slice()));
    let valid = state.validate(&schema);

    let renderer = FieldRenderer::with_options(RenderOptions::default().with_date_day_offset(date_offset));
    let form = DynamicForm::new(renderer, FormOptions::default());
    let rendered = if requested.is_empty() {
        form.render_all(&fields, &state)
    } else {
        form.render(Some(fields.as_slice()), Some(requested), &state)
    };

    tracing::info!("Rendered {} field(s), {} error(s)", rendered.len(), state.report().errors.len());
    Ok(FormReport {
        fields: rendered,
        valid,
        report: state.report().clone(),
    })
}
