// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Sentinel command-line client.

use std::sync::Arc;

use anyhow::{bail, Context};
use bastion_audit::{Journal, TracingAuditSink};
use bastion_config::BastionConfig;
use bastion_identity::FileIdentityAgent;
use bastion_protocol::SentinelCommand;
use bastion_sentinel::{PatternGenerator, SafeReply, Sentinel};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Bastion Sentinel - deliver keys and manage secrets on Safe.
#[derive(Parser, Debug)]
#[command(
	name = "bastion-sentinel",
	about = "Issue key delivery and secret commands to Bastion Safe",
	version
)]
struct Args {
	/// Workload the secret belongs to
	#[arg(short = 'w', long)]
	workload: Option<String>,

	/// Secret value, or a generation pattern behind the configured prefix
	#[arg(short = 's', long)]
	secret: Option<String>,

	/// Namespace to publish the secret to (repeatable)
	#[arg(short = 'n', long = "namespace")]
	namespaces: Vec<String>,

	/// Backing store: `file` or `memory`
	#[arg(short = 'b', long)]
	store: Option<String>,

	/// Also publish the secret as a Kubernetes secret
	#[arg(short = 'k', long = "use-k8s")]
	use_k8s: bool,

	/// Template applied to the secret value
	#[arg(short = 't', long)]
	template: Option<String>,

	/// Output format: `json` or `yaml`
	#[arg(short = 'f', long)]
	format: Option<String>,

	/// Encrypt the value before it leaves Sentinel
	#[arg(short = 'e', long)]
	encrypt: bool,

	/// Append to the existing value instead of replacing it
	#[arg(short = 'a', long)]
	append: bool,

	/// Delete the secret
	#[arg(short = 'd', long)]
	delete: bool,

	/// Earliest time the secret is valid (`now` by default)
	#[arg(short = 'N', long = "not-before")]
	not_before: Option<String>,

	/// Expiry time of the secret (`never` by default)
	#[arg(short = 'E', long)]
	expires: Option<String>,

	/// Newline-separated age secret key, age public key and AES cipher key
	#[arg(short = 'i', long = "input-keys")]
	input_keys: Option<String>,

	/// List secrets instead of sending a command
	#[arg(short = 'l', long)]
	list: bool,

	/// With --list, ask Safe for decrypted values
	#[arg(short = 'r', long)]
	reveal: bool,

	/// Tell Safe initialization has completed
	#[arg(long = "init-completed")]
	init_completed: bool,

	/// Emit logs as JSON
	#[arg(long = "json-logs")]
	json_logs: bool,
}

impl Args {
	fn command(&self) -> SentinelCommand {
		SentinelCommand {
			workload_id: self.workload.clone().unwrap_or_default(),
			secret: self.secret.clone().unwrap_or_default(),
			namespaces: self.namespaces.clone(),
			backing_store: self.store.clone().unwrap_or_default(),
			use_kubernetes: self.use_k8s,
			template: self.template.clone().unwrap_or_default(),
			format: self.format.clone().unwrap_or_default(),
			encrypt: self.encrypt,
			append_secret: self.append,
			not_before: self.not_before.clone().unwrap_or_default(),
			expires: self.expires.clone().unwrap_or_default(),
			delete_secret: self.delete,
			input_keys: self.input_keys.clone().unwrap_or_default(),
		}
	}
}

fn init_tracing(json: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let registry = tracing_subscriber::registry().with(filter);
	if json {
		registry.with(fmt::layer().json()).init();
	} else {
		registry.with(fmt::layer()).init();
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	init_tracing(args.json_logs);

	let config = BastionConfig::from_env().context("loading configuration")?;
	let agent = FileIdentityAgent::from_address(&config.agent_address)
		.context("locating identity agent")?;
	let journal = Journal::new(
		config.audit_queue_capacity,
		vec![Arc::new(TracingAuditSink::default())],
	);
	let sentinel = Sentinel::new(
		&config,
		Arc::new(agent),
		Arc::new(PatternGenerator::new()),
		journal.clone(),
	);

	let scope = CancellationToken::new();
	let interrupt = scope.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			tracing::warn!("interrupted; abandoning command");
			interrupt.cancel();
		}
	});

	let outcome = if args.list {
		sentinel.list_secrets(&scope, args.reveal).await
	} else if args.init_completed {
		sentinel.post_init_completed(&scope).await
	} else {
		let command = args.command();
		if command.workload_id.is_empty() && command.input_keys.is_empty() {
			bail!("nothing to do: pass --workload, --input-keys, --list or --init-completed");
		}
		sentinel.post(&scope, &command).await
	};

	if let Err(e) = journal.flush().await {
		tracing::warn!(error = %e, "audit journal did not drain");
	}

	let SafeReply { body, .. } = outcome?;
	println!();
	println!("{body}");
	println!();
	Ok(())
}
