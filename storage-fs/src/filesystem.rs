// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;
use std::sync::Arc;

use storage_types::{FsSupport, FsType, OperationDetail, Partition};

use crate::error::{FsError, Result};

/// Operations the partition editor performs through a filesystem handler
pub trait FileSystem: Send + Sync {
    /// What this handler can do, probed from the host's tooling
    fn filesystem_support(&self) -> FsSupport;

    /// Fill in used/unused sectors and any messages for the partition
    fn set_used_sectors(&self, partition: &mut Partition);

    fn read_label(&self, partition: &mut Partition);

    fn write_label(&self, partition: &Partition, detail: &mut OperationDetail) -> Result<()>;

    fn read_uuid(&self, partition: &mut Partition);

    fn write_uuid(&self, partition: &Partition, detail: &mut OperationDetail) -> Result<()>;

    fn create(&self, new_partition: &Partition, detail: &mut OperationDetail) -> Result<()>;

    fn resize(
        &self,
        partition_new: &Partition,
        detail: &mut OperationDetail,
        fill_partition: bool,
    ) -> Result<()>;

    fn move_partition(
        &self,
        partition_new: &Partition,
        partition_old: &Partition,
        detail: &mut OperationDetail,
    ) -> Result<()>;

    fn copy(
        &self,
        src_part_path: &str,
        dest_part_path: &str,
        detail: &mut OperationDetail,
    ) -> Result<()>;

    fn check_repair(&self, partition: &Partition, detail: &mut OperationDetail) -> Result<()>;
}

/// Filesystem handlers keyed by the content type they manage
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<FsType, Arc<dyn FileSystem>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, filesystem: FsType, handler: Arc<dyn FileSystem>) {
        self.handlers.insert(filesystem, handler);
    }

    pub fn get(&self, filesystem: FsType) -> Result<&dyn FileSystem> {
        self.handlers
            .get(&filesystem)
            .map(|handler| handler.as_ref())
            .ok_or(FsError::NoHandler(filesystem))
    }

    /// Support entries of every registered handler
    pub fn supported(&self) -> Vec<FsSupport> {
        self.handlers
            .values()
            .map(|handler| handler.filesystem_support())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_filesystem_has_no_handler() {
        let registry = Registry::new();
        let err = registry.get(FsType::Xfs).err().expect("no handler");
        assert!(matches!(err, FsError::NoHandler(FsType::Xfs)));
        assert_eq!(err.to_string(), "no handler registered for xfs");
        assert!(registry.supported().is_empty());
    }
}
