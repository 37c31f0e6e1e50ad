//! In-memory [`VirtualMachineApi`] for unit tests

use crate::cloudstack::{ApiError, Nic, VirtualMachine, VirtualMachineApi};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A running VM with one NIC and no host name or public IP
pub fn vm(name: &str, zone: &str) -> VirtualMachine {
    VirtualMachine {
        id: format!("id-{}", name),
        name: name.to_string(),
        display_name: name.to_string(),
        zone_name: zone.to_string(),
        service_offering_name: "Small Instance".to_string(),
        state: "Running".to_string(),
        nic: vec![Nic {
            ip_address: "10.0.0.5".to_string(),
            is_default: true,
            ..Default::default()
        }],
        ..Default::default()
    }
}

#[derive(Default)]
pub struct MockApi {
    vms: Vec<VirtualMachine>,
    fail: bool,
    /// Calls from this index on fail
    fail_from: Option<usize>,
    calls: AtomicUsize,
    last_project: Mutex<Option<String>>,
}

impl MockApi {
    pub fn with_vms(vms: Vec<VirtualMachine>) -> Self {
        Self {
            vms,
            ..Default::default()
        }
    }

    /// Every lookup fails with a server error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Serves `vms` for the first `n` calls, then fails
    pub fn failing_from(vms: Vec<VirtualMachine>, n: usize) -> Self {
        Self {
            vms,
            fail_from: Some(n),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_project(&self) -> Option<String> {
        self.last_project.lock().unwrap().clone()
    }

    fn find(
        &self,
        key: &str,
        project_id: Option<&str>,
        matches: impl Fn(&VirtualMachine) -> bool,
    ) -> Result<VirtualMachine, ApiError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_project.lock().unwrap() = project_id.map(str::to_string);

        if self.fail || self.fail_from.is_some_and(|n| call >= n) {
            return Err(ApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "management server unavailable".to_string(),
            });
        }

        self.vms
            .iter()
            .find(|vm| matches(vm))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl VirtualMachineApi for MockApi {
    async fn virtual_machine_by_name(
        &self,
        name: &str,
        project_id: Option<&str>,
    ) -> Result<VirtualMachine, ApiError> {
        self.find(name, project_id, |vm| vm.name == name)
    }

    async fn virtual_machine_by_id(
        &self,
        id: &str,
        project_id: Option<&str>,
    ) -> Result<VirtualMachine, ApiError> {
        self.find(id, project_id, |vm| vm.id == id)
    }
}
