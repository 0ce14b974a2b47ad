//! Rendering for terminal and `--json` output.

use anyhow::Result;
use osb_config::OsbConfig;
use osb_core::Report;
use osb_storage::StateStore;
use osb_types::{BindStatus, Catalog, DeprovisionStatus, ProvisionStatus, UnbindStatus};
use serde::Serialize;

/// A plain-text table whose cells may span several lines.
pub struct Table {
	headers: Vec<String>,
	rows: Vec<Vec<String>>,
}

impl Table {
	pub fn new(headers: &[&str]) -> Self {
		Self {
			headers: headers.iter().map(|h| h.to_string()).collect(),
			rows: Vec::new(),
		}
	}

	pub fn row(&mut self, cells: Vec<String>) {
		self.rows.push(cells);
	}

	pub fn render(&self) -> String {
		let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
		for row in &self.rows {
			for (i, cell) in row.iter().enumerate().take(widths.len()) {
				let width = cell.lines().map(|l| l.chars().count()).max().unwrap_or(0);
				widths[i] = widths[i].max(width);
			}
		}

		let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
		let mut out = String::new();
		push_line(&mut out, &widths, |i| self.headers[i].as_str());
		push_line(&mut out, &widths, |i| rule[i].as_str());

		for row in &self.rows {
			let cells: Vec<Vec<&str>> = (0..widths.len())
				.map(|i| row.get(i).map(|c| c.lines().collect()).unwrap_or_default())
				.collect();
			let height = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
			for line in 0..height {
				push_line(&mut out, &widths, |i| {
					cells[i].get(line).copied().unwrap_or("")
				});
			}
		}
		out
	}
}

fn push_line<'a>(out: &mut String, widths: &[usize], cell: impl Fn(usize) -> &'a str) {
	let line = widths
		.iter()
		.enumerate()
		.map(|(i, w)| format!("{:<width$}", cell(i), width = w))
		.collect::<Vec<_>>()
		.join("  ");
	out.push_str(line.trim_end());
	out.push('\n');
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

/// One row per binding, or one per instance without bindings. Repeated
/// broker and instance cells are left blank.
pub fn store_table(store: &StateStore) -> Table {
	let mut table = Table::new(&["Broker", "Instance", "Service", "Plan", "Binding", "Credentials"]);
	for broker in store.brokers() {
		let mut broker_name = broker.broker.clone();
		for instance in &broker.instances {
			if instance.bindings.is_empty() {
				table.row(vec![
					std::mem::take(&mut broker_name),
					instance.id.clone(),
					instance.service_id.clone(),
					instance.plan_id.clone(),
					"-".into(),
					"-".into(),
				]);
				continue;
			}

			let mut head = vec![
				instance.id.clone(),
				instance.service_id.clone(),
				instance.plan_id.clone(),
			];
			for binding in &instance.bindings {
				let credentials = serde_json::to_string_pretty(&binding.credentials)
					.unwrap_or_else(|e| format!("error: {}", e));
				let mut cells = vec![std::mem::take(&mut broker_name)];
				cells.extend(head.iter_mut().map(std::mem::take));
				cells.push(binding.id.clone());
				cells.push(credentials);
				table.row(cells);
			}
		}
	}
	table
}

pub fn catalog_table(catalog: &Catalog) -> Table {
	let or_none = |s: String| if s.is_empty() { "(none)".to_string() } else { s };

	let mut table = Table::new(&["Service", "(ID)", "Plans", "(IDs)", "Tags"]);
	for service in &catalog.services {
		let names: Vec<&str> = service.plans.iter().map(|p| p.name.as_str()).collect();
		let ids: Vec<&str> = service.plans.iter().map(|p| p.id.as_str()).collect();
		table.row(vec![
			service.name.clone(),
			service.id.clone(),
			or_none(names.join("\n")),
			ids.join("\n"),
			or_none(service.tags.join("\n")),
		]);
		table.row(Vec::new());
	}
	table
}

#[derive(Serialize)]
struct EnvExports<'a> {
	#[serde(rename = "OSB_URL")]
	url: &'a str,
	#[serde(rename = "OSB_USERNAME")]
	username: &'a str,
	#[serde(rename = "OSB_PASSWORD")]
	password: &'a str,
	#[serde(rename = "OSB_TIMEOUT")]
	timeout: u64,
	#[serde(rename = "OSB_DATA")]
	data: String,
	#[serde(rename = "OSB_TRACE")]
	trace: bool,
	#[serde(rename = "OSB_SKIP_VERIFY")]
	skip_verify: bool,
	#[serde(rename = "OSB_API_VERSION")]
	api_version: &'a str,
}

impl<'a> From<&'a OsbConfig> for EnvExports<'a> {
	fn from(config: &'a OsbConfig) -> Self {
		Self {
			url: &config.broker.endpoint,
			username: &config.broker.username,
			password: &config.broker.password,
			timeout: config.broker.timeout_secs,
			data: config.data_path.display().to_string(),
			trace: config.trace,
			skip_verify: config.broker.skip_verify,
			api_version: &config.broker.api_version,
		}
	}
}

fn yes_no(value: bool) -> &'static str {
	if value {
		"yes"
	} else {
		"no"
	}
}

pub fn env_exports(config: &OsbConfig) -> String {
	let env = EnvExports::from(config);
	format!(
		"export OSB_URL=\"{}\"\n\
		 export OSB_USERNAME=\"{}\"\n\
		 export OSB_PASSWORD=\"{}\"\n\
		 export OSB_TIMEOUT={}\n\
		 export OSB_DATA=\"{}\"\n\
		 export OSB_TRACE={}\n\
		 export OSB_SKIP_VERIFY={}\n\
		 export OSB_API_VERSION=\"{}\"\n",
		env.url,
		env.username,
		env.password,
		env.timeout,
		env.data,
		yes_no(env.trace),
		yes_no(env.skip_verify),
		env.api_version,
	)
}

pub fn print_env(config: &OsbConfig, json: bool) -> Result<()> {
	if json {
		return print_json(&EnvExports::from(config));
	}
	print!("{}", env_exports(config));
	Ok(())
}

/// `label: value` lines describing a lifecycle result.
pub trait StatusLines {
	fn lines(&self) -> Vec<(&'static str, String)>;
}

fn optional(lines: &mut Vec<(&'static str, String)>, label: &'static str, value: &Option<String>) {
	if let Some(value) = value {
		lines.push((label, value.clone()));
	}
}

impl StatusLines for ProvisionStatus {
	fn lines(&self) -> Vec<(&'static str, String)> {
		let mut lines = vec![
			("instance", self.instance_id.clone()),
			("status", self.status.to_string()),
		];
		optional(&mut lines, "dashboard", &self.dashboard_url);
		optional(&mut lines, "operation", &self.operation);
		lines
	}
}

impl StatusLines for BindStatus {
	fn lines(&self) -> Vec<(&'static str, String)> {
		let mut lines = vec![
			("instance", self.instance_id.clone()),
			("binding", self.binding_id.clone()),
			("status", self.status.to_string()),
		];
		optional(&mut lines, "operation", &self.details.operation);
		lines
	}
}

impl StatusLines for UnbindStatus {
	fn lines(&self) -> Vec<(&'static str, String)> {
		let mut lines = vec![
			("instance", self.instance_id.clone()),
			("binding", self.binding_id.clone()),
			("status", self.status.to_string()),
		];
		optional(&mut lines, "operation", &self.operation);
		lines
	}
}

impl StatusLines for DeprovisionStatus {
	fn lines(&self) -> Vec<(&'static str, String)> {
		let mut lines = vec![
			("instance", self.instance_id.clone()),
			("status", self.status.to_string()),
		];
		optional(&mut lines, "operation", &self.operation);
		lines
	}
}

pub fn render_lines(status: &impl StatusLines) -> String {
	let lines = status.lines();
	let width = lines.iter().map(|(label, _)| label.len() + 1).max().unwrap_or(0);
	lines
		.iter()
		.map(|(label, value)| format!("{:<width$} {}\n", format!("{}:", label), value, width = width))
		.collect()
}

/// Prints a lifecycle report. A persistence warning goes to stderr.
pub fn print_report<T: Serialize + StatusLines>(report: &Report<T>, json: bool) -> Result<()> {
	if json {
		print_json(report)?;
	} else {
		print!("{}", render_lines(&report.status));
	}
	if let Some(warning) = &report.persist_warning {
		eprintln!("!!! {}", warning);
	}
	Ok(())
}
