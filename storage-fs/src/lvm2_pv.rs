// SPDX-License-Identifier: GPL-3.0-only

//! LVM2 physical volume handler
//!
//! Physical volumes are only read. Every modifying operation is accepted
//! and does nothing; LVM changes are left to the LVM tools.

use std::sync::Arc;

use storage_sys::{Config, Lvm2PvInfo};
use storage_types::{FsSupport, FsType, OperationDetail, Partition, PvReport, SupportKind};
use tracing::debug;

use crate::error::Result;
use crate::filesystem::FileSystem;

pub struct Lvm2Pv {
    info: Arc<Lvm2PvInfo>,
}

impl Lvm2Pv {
    pub fn new(info: Arc<Lvm2PvInfo>) -> Self {
        Self { info }
    }

    /// Handler backed by the host's `lvm` command, set up from `config`
    pub fn system(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(Arc::new(Lvm2PvInfo::system(config.lvm.clone()))))
    }

    /// Summarize the PV behind `partition`, leaving `partition` untouched
    pub fn report(&self, partition: &Partition) -> PvReport {
        let mut partition = partition.clone();
        self.set_used_sectors(&mut partition);

        let path = partition.get_path();
        let vg_name = self.info.vg_name(path);
        let vg_exported = !vg_name.is_empty() && self.info.is_vg_exported(&vg_name);

        PvReport {
            path: path.to_string(),
            supported: self.info.is_lvm2_pv_supported(),
            has_active_lvs: self.info.has_active_lvs(path),
            free_bytes: self.info.free_bytes(path),
            vg_exported,
            vg_name,
            sectors_unused: partition.sectors_unused,
            messages: partition.messages,
        }
    }
}

fn bytes_to_sectors(bytes: u64, sector_size: u64) -> Option<u64> {
    (sector_size > 0).then(|| (bytes as f64 / sector_size as f64).round() as u64)
}

impl FileSystem for Lvm2Pv {
    fn filesystem_support(&self) -> FsSupport {
        let mut fs = FsSupport::new(FsType::Lvm2Pv);
        if self.info.is_lvm2_pv_supported() {
            fs.read = SupportKind::External;
        }
        fs
    }

    fn set_used_sectors(&self, partition: &mut Partition) {
        if let Some(free_bytes) = self.info.free_bytes(partition.get_path()) {
            match bytes_to_sectors(free_bytes, partition.sector_size) {
                Some(unused) => partition.set_unused(unused),
                None => debug!("{} has no sector size", partition.get_path()),
            }
        }

        let messages = self.info.error_messages(partition.get_path());
        partition.messages.extend(messages);
    }

    fn read_label(&self, _partition: &mut Partition) {}

    fn write_label(&self, _partition: &Partition, _detail: &mut OperationDetail) -> Result<()> {
        Ok(())
    }

    fn read_uuid(&self, _partition: &mut Partition) {}

    fn write_uuid(&self, _partition: &Partition, _detail: &mut OperationDetail) -> Result<()> {
        Ok(())
    }

    fn create(&self, _new_partition: &Partition, _detail: &mut OperationDetail) -> Result<()> {
        Ok(())
    }

    fn resize(
        &self,
        _partition_new: &Partition,
        _detail: &mut OperationDetail,
        _fill_partition: bool,
    ) -> Result<()> {
        Ok(())
    }

    fn move_partition(
        &self,
        _partition_new: &Partition,
        _partition_old: &Partition,
        _detail: &mut OperationDetail,
    ) -> Result<()> {
        Ok(())
    }

    fn copy(
        &self,
        _src_part_path: &str,
        _dest_part_path: &str,
        _detail: &mut OperationDetail,
    ) -> Result<()> {
        Ok(())
    }

    fn check_repair(&self, _partition: &Partition, _detail: &mut OperationDetail) -> Result<()> {
        Ok(())
    }
}
