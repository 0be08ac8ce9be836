//! CLI command definitions and handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};
use tabled::{Table, Tabled};

use cglimit_common::MemoryQuantity;

use crate::cgroup::{self, ControllerData, ResourceLimitSpec, Stats};
use crate::runtime::{DEFAULT_DRIVER, LimitRequest, RuntimeConfig, WorkloadStore, change_limits};

/// cglimit - change resource limits of running workloads
#[derive(Parser)]
#[command(name = "cglimit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Root directory for workload records
    #[arg(
        long,
        global = true,
        env = "CGLIMIT_ROOT",
        default_value = "/var/lib/cglimit"
    )]
    pub root: PathBuf,

    /// Cgroup hierarchy root (default: parent of the cpu controller mount)
    #[arg(long, global = true, env = "CGLIMIT_CGROUP_ROOT")]
    pub cgroup_root: Option<PathBuf>,

    /// Mount table used to find the cgroup hierarchy
    #[arg(
        long,
        global = true,
        env = "CGLIMIT_MOUNTINFO",
        default_value = "/proc/self/mountinfo"
    )]
    pub mountinfo: PathBuf,

    /// Cgroup membership of the init process
    #[arg(
        long,
        global = true,
        env = "CGLIMIT_INIT_CGROUP",
        default_value = "/proc/1/cgroup"
    )]
    pub init_cgroup: PathBuf,

    /// Directory workloads are placed under in every controller
    #[arg(long, global = true, env = "CGLIMIT_DRIVER", default_value = DEFAULT_DRIVER)]
    pub driver: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human readable table
    Table,
    /// JSON document
    Json,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Change resource limits of a running workload
    Limit {
        /// Workload ID
        workload_id: String,

        /// Memory limit (e.g. 512m, 1g)
        #[arg(short, long)]
        memory: Option<MemoryQuantity>,

        /// Memory soft limit
        #[arg(long)]
        memory_reservation: Option<MemoryQuantity>,

        /// Memory plus swap limit in bytes, -1 for unlimited
        #[arg(long, allow_hyphen_values = true)]
        memory_swap: Option<i64>,

        /// CPU shares (relative weight)
        #[arg(short, long)]
        cpu_shares: Option<u64>,

        /// CFS quota in microseconds, -1 for unlimited
        #[arg(long, allow_hyphen_values = true)]
        cpu_quota: Option<i64>,

        /// CFS period in microseconds
        #[arg(long)]
        cpu_period: Option<u64>,

        /// CPUs to pin the workload to (e.g. 0-3, 0,2)
        #[arg(long)]
        cpuset: Option<String>,

        /// Store the new limits in the workload record
        #[arg(short, long)]
        save: bool,
    },

    /// Display resource usage statistics
    Stats {
        /// Workload ID
        workload_id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: Format,
    },

    /// Read a single control file
    Get {
        /// Workload ID
        workload_id: String,

        /// Control file (e.g. cpu.shares)
        file: String,
    },

    /// Write a single control file
    Set {
        /// Workload ID
        workload_id: String,

        /// Control file (e.g. memory.limit_in_bytes)
        file: String,

        /// Value to write
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Remove a workload's cgroups
    Remove {
        /// Workload ID
        workload_id: String,
    },
}

impl Cli {
    /// Runtime configuration from the global flags.
    #[must_use]
    pub fn config(&self) -> RuntimeConfig {
        let mut config = RuntimeConfig::default()
            .with_root(self.root.clone())
            .with_mountinfo(self.mountinfo.clone())
            .with_init_cgroup(self.init_cgroup.clone())
            .with_driver(self.driver.clone());
        if let Some(root) = &self.cgroup_root {
            config = config.with_cgroup_root(root.clone());
        }
        config
    }

    /// Execute the CLI command.
    pub fn execute(self) -> Result<()> {
        let config = self.config();
        let store = WorkloadStore::new(config.paths.clone());

        match self.command {
            Commands::Limit {
                workload_id,
                memory,
                memory_reservation,
                memory_swap,
                cpu_shares,
                cpu_quota,
                cpu_period,
                cpuset,
                save,
            } => {
                let request = LimitRequest {
                    id: workload_id.clone(),
                    memory: memory.map_or(0, |m| m.as_bytes()),
                    memory_reservation: memory_reservation.map_or(0, |m| m.as_bytes()),
                    memory_swap: memory_swap.unwrap_or(0),
                    cpu_shares: cpu_shares.unwrap_or(0),
                    cpu_quota: cpu_quota.unwrap_or(0),
                    cpu_period: cpu_period.unwrap_or(0),
                    cpuset: cpuset.unwrap_or_default(),
                    save,
                };

                change_limits(&config, &request)?;
                println!("Workload {workload_id} limits changed");
                Ok(())
            }

            Commands::Stats {
                workload_id,
                format,
            } => {
                let record = store
                    .load(&workload_id)
                    .wrap_err("Failed to load workload")?;
                let spec = ResourceLimitSpec::new(workload_id.clone(), config.driver.clone());
                let stats = cgroup::get_all_stats(spec, record.pid, &config.hierarchy)
                    .wrap_err_with(|| format!("{workload_id}: Failed to read stats"))?;

                match format {
                    Format::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                    Format::Table => println!("{}", Table::new(stat_rows(&stats))),
                }
                Ok(())
            }

            Commands::Get { workload_id, file } => {
                let value = cgroup::get(&config.hierarchy, &workload_id, &config.driver, &file)
                    .wrap_err_with(|| format!("{workload_id}: Failed to read {file}"))?;
                println!("{value}");
                Ok(())
            }

            Commands::Set {
                workload_id,
                file,
                value,
            } => {
                cgroup::set(
                    &config.hierarchy,
                    &workload_id,
                    &config.driver,
                    &file,
                    &value,
                )
                .wrap_err_with(|| format!("{workload_id}: Failed to write {file}"))?;
                println!("{file} set to {value}");
                Ok(())
            }

            Commands::Remove { workload_id } => {
                let record = store
                    .load(&workload_id)
                    .wrap_err("Failed to load workload")?;
                let spec = ResourceLimitSpec::new(workload_id.clone(), config.driver.clone());
                let data = ControllerData::new(spec, record.pid, config.hierarchy.clone())?;
                cgroup::remove_resources(&data)
                    .wrap_err_with(|| format!("{workload_id}: Failed to remove cgroups"))?;
                println!("Workload {workload_id} cgroups removed");
                Ok(())
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq, Tabled)]
struct StatRow {
    #[tabled(rename = "CONTROLLER")]
    controller: &'static str,
    #[tabled(rename = "COUNTER")]
    counter: &'static str,
    #[tabled(rename = "VALUE")]
    value: String,
}

fn stat_rows(stats: &Stats) -> Vec<StatRow> {
    let mut rows = Vec::new();
    let mut row = |controller: &'static str, counter: &'static str, value: String| {
        rows.push(StatRow {
            controller,
            counter,
            value,
        });
    };

    if let Some(cpu) = &stats.cpu {
        row("cpu", "shares", cpu.shares.to_string());
        row("cpu", "nr_periods", cpu.nr_periods.to_string());
        row("cpu", "nr_throttled", cpu.nr_throttled.to_string());
        row("cpu", "throttled_time", cpu.throttled_time.to_string());
    }
    if let Some(memory) = &stats.memory {
        let bytes = |n: u64| MemoryQuantity::bytes(n).to_string();
        row("memory", "usage", bytes(memory.usage.usage));
        row("memory", "max_usage", bytes(memory.usage.max_usage));
        row("memory", "limit", bytes(memory.usage.limit));
        row("memory", "failcnt", memory.usage.failcnt.to_string());
        if let Some(swap) = &memory.swap_usage {
            row("memory", "swap_usage", bytes(swap.usage));
            row("memory", "swap_limit", bytes(swap.limit));
        }
    }
    if let Some(cpuset) = &stats.cpuset {
        row("cpuset", "cpus", cpuset.cpus.clone());
        row("cpuset", "mems", cpuset.mems.clone());
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_limit_flags() {
        let cli = Cli::try_parse_from([
            "cglimit",
            "limit",
            "web",
            "--memory",
            "512m",
            "--cpu-quota",
            "-1",
            "--cpuset",
            "0-1",
            "--save",
        ])
        .unwrap();

        match cli.command {
            Commands::Limit {
                memory,
                cpu_quota,
                cpuset,
                save,
                cpu_shares,
                ..
            } => {
                assert_eq!(memory, Some(MemoryQuantity::bytes(536_870_912)));
                assert_eq!(cpu_quota, Some(-1));
                assert_eq!(cpuset.as_deref(), Some("0-1"));
                assert_eq!(cpu_shares, None);
                assert!(save);
            }
            _ => panic!("expected limit command"),
        }
    }

    #[test]
    fn config_from_flags() {
        let cli = Cli::try_parse_from([
            "cglimit",
            "--root",
            "/tmp/state",
            "--driver",
            "lxc",
            "get",
            "web",
            "cpu.shares",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.driver, "lxc");
        assert_eq!(config.paths.root, PathBuf::from("/tmp/state"));
    }

    #[test]
    fn stat_rows_skip_absent_controllers() {
        let stats = Stats {
            cpu: Some(crate::cgroup::CpuStats {
                shares: 1024,
                nr_periods: 120,
                nr_throttled: 7,
                throttled_time: 5_500_000,
            }),
            cpuset: Some(crate::cgroup::CpusetStats {
                cpus: "0-3".to_string(),
                mems: "0".to_string(),
            }),
            ..Stats::default()
        };

        let rows: Vec<_> = stat_rows(&stats)
            .into_iter()
            .map(|r| (r.controller, r.counter, r.value))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("cpu", "shares", "1024".to_string()),
                ("cpu", "nr_periods", "120".to_string()),
                ("cpu", "nr_throttled", "7".to_string()),
                ("cpu", "throttled_time", "5500000".to_string()),
                ("cpuset", "cpus", "0-3".to_string()),
                ("cpuset", "mems", "0".to_string()),
            ]
        );
    }

    #[test]
    fn memory_rows_use_binary_units() {
        let stats = Stats {
            memory: Some(crate::cgroup::MemoryStats {
                usage: crate::cgroup::MemoryData {
                    usage: 1_048_576,
                    max_usage: 2_097_152,
                    failcnt: 0,
                    limit: 536_870_912,
                },
                ..crate::cgroup::MemoryStats::default()
            }),
            ..Stats::default()
        };

        let rows = stat_rows(&stats);
        assert_eq!(rows[0].value, "1Mi");
        assert_eq!(rows[2].value, "512Mi");
        assert!(rows.iter().all(|r| r.counter != "swap_usage"));
    }
}
