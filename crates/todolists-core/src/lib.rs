pub mod action;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod http;
pub mod lists;
pub mod prefs;
pub mod render;
pub mod status;
pub mod store;
pub mod sync;
pub mod tasks;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use action::Action;
pub use api::TodolistApi;
pub use status::{
  AppState,
  RequestStatus
};
pub use store::{
  RootState,
  Store
};
pub use sync::Synchronizer;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting todo CLI"
  );
  debug!(
    count = pre.rc_overrides.len(),
    "preprocessed rc overrides"
  );

  let mut cfg = config::Config::load(
    cli.todorc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let mut prefs =
    prefs::FilterPrefs::open(&data_dir)
      .with_context(|| {
        format!(
          "failed to open filter \
           preferences at {}",
          data_dir.display()
        )
      })?;

  let mut renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  let api =
    http::HttpTodolistApi::from_config(
      &cfg
    )?;
  let sync = Synchronizer::new(
    api,
    Store::new()
  );

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;
  runtime.block_on(commands::dispatch(
    &sync,
    &mut prefs,
    &mut renderer,
    inv
  ))?;

  info!("done");
  Ok(())
}
