// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Subcommands:
// - fetch:    run the whole pipeline and print the grader-ready document
// - classify: only classify a submission URL (handy when a link misbehaves)
// - outline:  list the files a previously produced document contains
//
// The limit flags on `fetch` override whatever the config file says.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "repo-intake",
    version,
    about = "Turns a student's GitHub submission into a bounded, grader-ready text document",
    long_about = "repo-intake takes whatever GitHub link a student submitted (a repository, a branch, \
                  a folder or a single file), finds the code behind it and flattens the relevant part \
                  into one Markdown document an automated grader can read."
)]
pub struct Cli {
    /// Log filter, e.g. "debug" or "repo_intake=trace" (RUST_LOG wins when set)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a submission and print the document
    ///
    /// Example: repo-intake fetch https://github.com/alice/todo-app --max-files 10
    Fetch(FetchArgs),

    /// Classify a submission URL without fetching anything
    ///
    /// Example: repo-intake classify https://github.com/bob/cs50/tree/main/Final-Project
    Classify {
        /// Submission URL
        url: String,

        /// Print the reference as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the files contained in a produced document
    ///
    /// Example: repo-intake outline submission.md
    Outline {
        /// Document written by `fetch`
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Submission URL (repository, tree, blob or raw link)
    pub url: String,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the document here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Most files the document may contain
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Most bytes of file content the document may contain
    #[arg(long)]
    pub max_total_bytes: Option<usize>,

    /// Per-file size after which content is truncated
    #[arg(long)]
    pub max_file_bytes: Option<usize>,

    /// How many directory levels the walk descends
    #[arg(long)]
    pub max_depth: Option<usize>,
}
