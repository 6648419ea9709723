// SPDX-License-Identifier: GPL-3.0-only

//! LVM2 physical volume information cache
//!
//! `lvm pvs` is run once and its output kept in memory until the cache is
//! explicitly refreshed. Each cached row holds the attributes of one PV, or
//! of one PV and one of the LVs stored on it, e.g.:
//!
//! ```text
//! /dev/sda10,2147483648,,r-----,,
//! /dev/sda12,1619001344,data-vg2,wz--n-,lvol0,-wi---
//! /dev/sda12,1619001344,data-vg2,wz--n-,,
//! /dev/sda13,830472192,data_vg3,wz--n-,lvol0,-wi-a-
//! /dev/sda14,1828716544,data-vg4,wzx-n-,,
//! ```
//!
//! See vgs(8) and lvs(8) for the meaning of `vg_attr` and `lv_attr`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::cmd::{CommandRunner, CommandSpec, SystemRunner};
use crate::config::LvmConfig;

/// Third `vg_attr` character: `x` when the VG is exported
const VG_ATTR_EXPORTED: usize = 2;
/// Fourth `vg_attr` character: `p` when one or more PVs are missing
const VG_ATTR_PARTIAL: usize = 3;
/// Fifth `lv_attr` character: `a` when the LV is active
const LV_ATTR_ACTIVE: usize = 4;

const PVS_FIELDS: &str = "pv_name,pv_free,vg_name,vg_attr,lv_name,lv_attr";

pub const PARTIAL_VG_MESSAGE: &str =
    "One or more Physical Volumes belonging to the Volume Group is missing.";

pub const LOAD_FAILED_MESSAGE: &str = "An error occurred reading LVM2 configuration!\n\
     Some or all of the details might be missing or incorrect.\n\
     You should NOT modify any LVM2 PV partitions.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PvRow {
    pv_name: String,
    pv_free: String,
    vg_name: String,
    vg_attr: String,
    lv_name: String,
    lv_attr: String,
}

impl PvRow {
    fn parse(line: &str) -> Self {
        let mut cols = line.split(',').map(str::to_string);
        let mut next = || cols.next().unwrap_or_default();
        Self {
            pv_name: next(),
            pv_free: next(),
            vg_name: next(),
            vg_attr: next(),
            lv_name: next(),
            lv_attr: next(),
        }
    }
}

fn parse_pvs(output: &str) -> Vec<PvRow> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PvRow::parse)
        .collect()
}

/// A flag in an attribute string is set when present and not `-`.
fn attr_bit_set(bits: &str, index: usize) -> bool {
    bits.as_bytes().get(index).is_some_and(|bit| *bit != b'-')
}

/// Parse the leading decimal integer of `value` the way `strtoll` does:
/// optional whitespace and sign, at least one digit, trailing text ignored.
/// Returns `None` when no digit is found or the number is negative.
fn parse_free_bytes(value: &str) -> Option<u64> {
    let value = value.trim_start();
    let (negative, unsigned) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let digits = unsigned
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }

    let number = unsigned[..digits]
        .parse::<u64>()
        .map_or(i64::MAX as u64, |n| n.min(i64::MAX as u64));

    if negative && number > 0 {
        return None;
    }
    Some(number)
}

#[derive(Debug, Default)]
struct CacheState {
    initialized: bool,
    lvm_found: Option<bool>,
    rows: Vec<PvRow>,
    error_messages: Vec<String>,
}

impl CacheState {
    fn row_by_path(&self, path: &str) -> Option<&PvRow> {
        self.rows.iter().find(|row| row.pv_name == path)
    }
}

/// Cached view of `lvm pvs` output
pub struct Lvm2PvInfo {
    runner: Arc<dyn CommandRunner>,
    config: LvmConfig,
    state: Mutex<CacheState>,
}

impl Lvm2PvInfo {
    /// Create a cache that loads on first query
    pub fn new(runner: Arc<dyn CommandRunner>, config: LvmConfig) -> Self {
        Self {
            runner,
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Create a cache and load it immediately
    pub fn with_refresh(runner: Arc<dyn CommandRunner>, config: LvmConfig) -> Self {
        let cache = Self::new(runner, config);
        cache.refresh();
        cache
    }

    /// Create a lazily loaded cache backed by the host's `lvm` command
    pub fn system(config: LvmConfig) -> Self {
        let runner = SystemRunner::with_timeout(config.command_timeout());
        Self::new(Arc::new(runner), config)
    }

    /// Re-probe for the lvm tool and reload the cache
    pub fn refresh(&self) {
        let mut state = self.lock();
        self.load(&mut state);
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().initialized
    }

    /// Whether the lvm tool is available.
    ///
    /// Before the first load this only probes for the tool.
    pub fn is_lvm2_pv_supported(&self) -> bool {
        let mut state = self.lock();
        if !state.initialized && state.lvm_found.is_none() {
            state.lvm_found = Some(self.detect_tool());
        }
        state.lvm_found.unwrap_or(false)
    }

    /// Volume group of the PV, or an empty string
    pub fn vg_name(&self, path: &str) -> String {
        let state = self.loaded();
        state
            .row_by_path(path)
            .map(|row| row.vg_name.clone())
            .unwrap_or_default()
    }

    /// Free bytes in the PV, `None` when unknown
    pub fn free_bytes(&self, path: &str) -> Option<u64> {
        let state = self.loaded();
        state
            .row_by_path(path)
            .and_then(|row| parse_free_bytes(&row.pv_free))
    }

    /// Whether any LV in the VG stored on the PV is active
    pub fn has_active_lvs(&self, path: &str) -> bool {
        let state = self.loaded();
        let vg_name = match state.row_by_path(path) {
            Some(row) if !row.vg_name.is_empty() => row.vg_name.as_str(),
            // PV not yet included in any VG
            _ => return false,
        };

        state
            .rows
            .iter()
            .filter(|row| row.vg_name == vg_name)
            .any(|row| attr_bit_set(&row.lv_attr, LV_ATTR_ACTIVE))
    }

    /// Whether the VG is exported
    pub fn is_vg_exported(&self, vg_name: &str) -> bool {
        let state = self.loaded();
        state
            .rows
            .iter()
            .filter(|row| row.vg_name == vg_name)
            .any(|row| attr_bit_set(&row.vg_attr, VG_ATTR_EXPORTED))
    }

    /// Diagnostics to show for the PV.
    ///
    /// Errors from loading the whole cache take precedence over messages
    /// specific to the PV.
    pub fn error_messages(&self, path: &str) -> Vec<String> {
        let state = self.loaded();
        if !state.error_messages.is_empty() {
            return state.error_messages.clone();
        }

        let partial = state
            .row_by_path(path)
            .is_some_and(|row| attr_bit_set(&row.vg_attr, VG_ATTR_PARTIAL));
        if partial {
            vec![PARTIAL_VG_MESSAGE.to_string()]
        } else {
            Vec::new()
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn loaded(&self) -> MutexGuard<'_, CacheState> {
        let mut state = self.lock();
        if !state.initialized {
            self.load(&mut state);
        }
        state
    }

    fn detect_tool(&self) -> bool {
        if !cfg!(feature = "lvm-tools") {
            return false;
        }

        match self.runner.find_program(&self.config.program) {
            Some(path) => {
                debug!("Found {} at {:?}", self.config.program, path);
                true
            }
            None => {
                debug!("{} not found on PATH", self.config.program);
                false
            }
        }
    }

    fn load(&self, state: &mut CacheState) {
        state.rows.clear();
        state.error_messages.clear();

        let lvm_found = self.detect_tool();
        state.lvm_found = Some(lvm_found);
        state.initialized = true;
        if !lvm_found {
            return;
        }

        // The OS is expected to have activated LVM already; the scan only
        // picks up changes made without the lvm commands.
        if self.config.rescan {
            let vgscan = CommandSpec::new(self.config.program.as_str(), ["vgscan"]);
            match self.runner.run(&vgscan) {
                Ok(output) if !output.success => {
                    debug!("{} exited with {:?}", vgscan.render(), output.code)
                }
                Ok(_) => {}
                Err(err) => debug!("{} failed: {}", vgscan.render(), err),
            }
        }

        let pvs = CommandSpec::new(
            self.config.program.as_str(),
            [
                "pvs",
                "--config",
                "log{command_names=0}",
                "--nosuffix",
                "--noheadings",
                "--separator",
                ",",
                "--units",
                "b",
                "-o",
                PVS_FIELDS,
            ],
        );
        let command = pvs.render();

        let (stdout, stderr) = match self.runner.run(&pvs) {
            Ok(output) if output.success => {
                state.rows = parse_pvs(&output.stdout);
                info!("Loaded {} LVM2 PV rows", state.rows.len());
                return;
            }
            Ok(output) => (output.stdout, output.stderr),
            Err(err) => (String::new(), err.detail()),
        };

        warn!("{} failed: {}", command, stderr.trim());
        state.error_messages.push(command);
        if !stdout.is_empty() {
            state.error_messages.push(stdout);
        }
        if !stderr.is_empty() {
            state.error_messages.push(stderr);
        }
        state.error_messages.push(LOAD_FAILED_MESSAGE.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::fake::FakeRunner;
    use crate::cmd::CommandOutput;
    use std::thread;

    const PVS_COMMAND: &str = "lvm pvs --config \"log{command_names=0}\" --nosuffix --noheadings --separator , --units b -o pv_name,pv_free,vg_name,vg_attr,lv_name,lv_attr";

    const PVS_OUTPUT: &str = "  /dev/sda10,2147483648,,r-----,,
  /dev/sda11,2143289344,data-vg1,wz--n-,,
  /dev/sda12,1619001344,data-vg2,wz--n-,lvol0,-wi---
  /dev/sda12,1619001344,data-vg2,wz--n-,,
  /dev/sda13,830472192,data_vg3,wz--n-,lvol0,-wi-a-
  /dev/sda13,830472192,data_vg3,wz--n-,lvol1,-wi-a-
  /dev/sda13,830472192,data_vg3,wz--n-,,
  /dev/sda14,1828716544,data-vg4,wzx-n-,lvol0,-wi---
  /dev/sda14,1828716544,data-vg4,wzx-n-,,
  /dev/sda15,,data-vg5,wz-pn-,,
  /dev/sda16,abc,,,,
";

    fn runner_with_output(stdout: &str) -> Arc<FakeRunner> {
        let runner = FakeRunner::with_programs(&["lvm"]);
        runner.succeed("lvm vgscan", "");
        runner.succeed(PVS_COMMAND, stdout);
        Arc::new(runner)
    }

    fn cache(runner: &Arc<FakeRunner>) -> Lvm2PvInfo {
        Lvm2PvInfo::new(runner.clone(), LvmConfig::default())
    }

    #[test]
    fn parses_rows_with_missing_fields() {
        let rows = parse_pvs("/dev/sda1,10\n\n   \n/dev/sda2,20,vg,wz--n-,lv,-wi-a-\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pv_free, "10");
        assert_eq!(rows[0].vg_name, "");
        assert_eq!(rows[0].lv_attr, "");
        assert_eq!(rows[1].lv_name, "lv");
    }

    #[test]
    fn attribute_bits_are_bounds_checked() {
        assert!(attr_bit_set("wzx-n-", VG_ATTR_EXPORTED));
        assert!(!attr_bit_set("wz--n-", VG_ATTR_EXPORTED));
        assert!(!attr_bit_set("wz", VG_ATTR_EXPORTED));
        assert!(!attr_bit_set("", LV_ATTR_ACTIVE));
    }

    #[test]
    fn free_bytes_parsing_follows_strtoll() {
        assert_eq!(parse_free_bytes("2147483648"), Some(2147483648));
        assert_eq!(parse_free_bytes("0"), Some(0));
        assert_eq!(parse_free_bytes(" 42"), Some(42));
        assert_eq!(parse_free_bytes("+7"), Some(7));
        assert_eq!(parse_free_bytes("123abc"), Some(123));
        assert_eq!(parse_free_bytes("-0"), Some(0));
        assert_eq!(parse_free_bytes(""), None);
        assert_eq!(parse_free_bytes("abc"), None);
        assert_eq!(parse_free_bytes("-5"), None);
        assert_eq!(parse_free_bytes("-"), None);
        assert_eq!(
            parse_free_bytes("99999999999999999999999"),
            Some(i64::MAX as u64)
        );
    }

    #[test]
    fn loads_lazily_on_first_query() {
        let runner = runner_with_output(PVS_OUTPUT);
        let info = cache(&runner);
        assert!(!info.is_loaded());
        assert_eq!(runner.call_count(PVS_COMMAND), 0);

        assert_eq!(info.vg_name("/dev/sda11"), "data-vg1");
        assert!(info.is_loaded());
        assert_eq!(runner.call_count("lvm vgscan"), 1);
        assert_eq!(runner.call_count(PVS_COMMAND), 1);
    }

    #[test]
    fn eager_construction_loads_immediately() {
        let runner = runner_with_output(PVS_OUTPUT);
        let info = Lvm2PvInfo::with_refresh(runner.clone(), LvmConfig::default());
        assert!(info.is_loaded());
        assert_eq!(runner.call_count(PVS_COMMAND), 1);
    }

    #[test]
    fn support_probe_does_not_load() {
        let runner = runner_with_output(PVS_OUTPUT);
        let info = cache(&runner);
        assert!(info.is_lvm2_pv_supported());
        assert!(!info.is_loaded());
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn vg_name_uses_first_matching_row() {
        let runner = runner_with_output(PVS_OUTPUT);
        let info = cache(&runner);
        assert_eq!(info.vg_name("/dev/sda12"), "data-vg2");
        assert_eq!(info.vg_name("/dev/sda10"), "");
        assert_eq!(info.vg_name("/dev/sdz1"), "");
    }

    #[test]
    fn free_bytes_for_known_and_unknown_rows() {
        let runner = runner_with_output(PVS_OUTPUT);
        let info = cache(&runner);
        assert_eq!(info.free_bytes("/dev/sda10"), Some(2147483648));
        assert_eq!(info.free_bytes("/dev/sda15"), None);
        assert_eq!(info.free_bytes("/dev/sda16"), None);
        assert_eq!(info.free_bytes("/dev/sdz1"), None);
    }

    #[test]
    fn active_lvs_are_found_across_the_volume_group() {
        let runner = runner_with_output(PVS_OUTPUT);
        let info = cache(&runner);
        assert!(info.has_active_lvs("/dev/sda13"));
        assert!(!info.has_active_lvs("/dev/sda12"));
        assert!(!info.has_active_lvs("/dev/sda14"));
        // Not in a VG
        assert!(!info.has_active_lvs("/dev/sda10"));
        assert!(!info.has_active_lvs("/dev/sdz1"));
    }

    #[test]
    fn active_lv_on_another_pv_of_the_same_vg_counts() {
        let output = "/dev/sda14,1828716544,data-vg4,wzx-n-,lvol0,-wi---\n\
                      /dev/sda14,1828716544,data-vg4,wzx-n-,,\n\
                      /dev/sdb1,1000,data-vg4,wzx-n-,lvol1,-wi-a-\n";
        let runner = runner_with_output(output);
        let info = cache(&runner);
        assert!(info.has_active_lvs("/dev/sda14"));
    }

    #[test]
    fn exported_volume_groups() {
        let runner = runner_with_output(PVS_OUTPUT);
        let info = cache(&runner);
        assert!(info.is_vg_exported("data-vg4"));
        assert!(!info.is_vg_exported("data-vg1"));
        assert!(!info.is_vg_exported("NoSuchVG"));
    }

    #[test]
    fn partial_volume_group_produces_advisory() {
        let runner = runner_with_output(PVS_OUTPUT);
        let info = cache(&runner);
        assert_eq!(
            info.error_messages("/dev/sda15"),
            vec![PARTIAL_VG_MESSAGE.to_string()]
        );
        assert!(info.error_messages("/dev/sda11").is_empty());
        assert!(info.error_messages("/dev/sdz1").is_empty());
    }

    #[test]
    fn failed_listing_reports_whole_cache_errors() {
        let runner = Arc::new(FakeRunner::with_programs(&["lvm"]));
        runner.respond(
            PVS_COMMAND,
            CommandOutput {
                stdout: "partial output\n".to_string(),
                stderr: "  Locking failed\n".to_string(),
                success: false,
                code: Some(5),
            },
        );
        let info = cache(&runner);

        let expected = vec![
            PVS_COMMAND.to_string(),
            "partial output\n".to_string(),
            "  Locking failed\n".to_string(),
            LOAD_FAILED_MESSAGE.to_string(),
        ];
        assert_eq!(info.error_messages("/dev/sda15"), expected);
        assert_eq!(info.error_messages("/dev/sdz1"), expected);
        assert_eq!(info.vg_name("/dev/sda11"), "");
        assert_eq!(info.free_bytes("/dev/sda10"), None);
    }

    #[test]
    fn timed_out_listing_reports_whole_cache_errors() {
        let runner = Arc::new(FakeRunner::with_programs(&["lvm"]));
        runner.succeed("lvm vgscan", "");
        runner.time_out(PVS_COMMAND, 60);
        let info = cache(&runner);

        let expected = vec![
            PVS_COMMAND.to_string(),
            "timed out after 60s".to_string(),
            LOAD_FAILED_MESSAGE.to_string(),
        ];
        assert_eq!(info.error_messages("/dev/sda10"), expected);
        assert_eq!(info.error_messages("/dev/sdz1"), expected);
        assert!(info.is_lvm2_pv_supported());
        assert_eq!(info.free_bytes("/dev/sda10"), None);
    }

    #[test]
    fn empty_streams_are_left_out_of_errors() {
        let runner = Arc::new(FakeRunner::with_programs(&["lvm"]));
        runner.succeed("lvm vgscan", "");
        runner.respond(
            PVS_COMMAND,
            CommandOutput {
                success: false,
                code: Some(1),
                ..CommandOutput::default()
            },
        );
        let info = cache(&runner);
        assert_eq!(
            info.error_messages("/dev/sda1"),
            vec![PVS_COMMAND.to_string(), LOAD_FAILED_MESSAGE.to_string()]
        );
    }

    #[test]
    fn vgscan_failure_is_ignored() {
        // No canned vgscan response, so the fake runner fails it
        let runner = Arc::new(FakeRunner::with_programs(&["lvm"]));
        runner.succeed(PVS_COMMAND, PVS_OUTPUT);
        let info = cache(&runner);
        assert_eq!(info.vg_name("/dev/sda11"), "data-vg1");
        assert!(info.error_messages("/dev/sda11").is_empty());
    }

    #[test]
    fn rescan_can_be_disabled() {
        let runner = runner_with_output(PVS_OUTPUT);
        let config = LvmConfig {
            rescan: false,
            ..LvmConfig::default()
        };
        let info = Lvm2PvInfo::new(runner.clone(), config);
        info.refresh();
        assert_eq!(runner.call_count("lvm vgscan"), 0);
        assert_eq!(runner.call_count(PVS_COMMAND), 1);
    }

    #[test]
    fn missing_tool_degrades_silently() {
        let runner = Arc::new(FakeRunner::default());
        let info = cache(&runner);
        assert!(!info.is_lvm2_pv_supported());
        assert_eq!(info.vg_name("/dev/sda11"), "");
        assert_eq!(info.free_bytes("/dev/sda11"), None);
        assert!(!info.has_active_lvs("/dev/sda11"));
        assert!(!info.is_vg_exported("data-vg1"));
        assert!(info.error_messages("/dev/sda11").is_empty());
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn repeated_queries_are_stable() {
        let runner = runner_with_output(PVS_OUTPUT);
        let info = cache(&runner);
        for _ in 0..2 {
            assert_eq!(info.vg_name("/dev/sda13"), "data_vg3");
            assert_eq!(info.free_bytes("/dev/sda13"), Some(830472192));
            assert!(info.has_active_lvs("/dev/sda13"));
        }
        assert_eq!(runner.call_count(PVS_COMMAND), 1);
    }

    #[test]
    fn refresh_picks_up_new_output() {
        let runner = runner_with_output("/dev/sda11,100,,,,\n");
        let info = cache(&runner);
        assert_eq!(info.vg_name("/dev/sda11"), "");

        runner.succeed(PVS_COMMAND, "/dev/sda11,100,data-vg1,wz--n-,,\n");
        assert_eq!(info.vg_name("/dev/sda11"), "");
        info.refresh();
        assert_eq!(info.vg_name("/dev/sda11"), "data-vg1");
        assert_eq!(runner.call_count(PVS_COMMAND), 2);
    }

    #[test]
    fn concurrent_first_use_loads_once() {
        let runner = runner_with_output(PVS_OUTPUT);
        let info = Arc::new(cache(&runner));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let info = info.clone();
                thread::spawn(move || info.free_bytes("/dev/sda10"))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(2147483648));
        }
        assert_eq!(runner.call_count(PVS_COMMAND), 1);
    }
}
