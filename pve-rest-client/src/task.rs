//! Polling of asynchronous server side tasks.

use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use pve_http::HttpClient;

use crate::params::ParameterMap;
use crate::{Client, RequestDescriptor, ResponseEnvelope};

/// Default delay between two status checks.
pub const DEFAULT_POLL_INTERVAL_MS: i64 = 500;

/// Default time to wait for a task.
pub const DEFAULT_TIMEOUT_MS: i64 = 10_000;

/// Extra time granted when the timeout is shorter than the poll interval.
const TIMEOUT_GRACE_MS: i64 = 5_000;

/// Get the node a task runs on from its UPID (`UPID:{node}:...`).
pub fn upid_node(upid: &str) -> Option<&str> {
    upid.split(':').nth(1).filter(|node| !node.is_empty())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IsRunning {
    Running,
    Stopped,
}
serde_plain::derive_display_from_serialize!(IsRunning);
serde_plain::derive_fromstr_from_deserialize!(IsRunning);

impl IsRunning {
    pub fn is_running(self) -> bool {
        self == IsRunning::Running
    }
}

/// The data of a task status request.
#[derive(Debug, Deserialize, Serialize)]
pub struct TaskStatus {
    pub status: IsRunning,

    /// Set once the task stopped, `OK` on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exitstatus: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    #[serde(deserialize_with = "pve_login::parse::deserialize_i64")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<i64>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Options for [`Client::wait_until_finished`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WaitOptions {
    pub poll_interval_ms: i64,
    pub timeout_ms: i64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl WaitOptions {
    /// Replace degenerate values.
    ///
    /// A non-positive interval becomes the default interval, a timeout shorter than the interval
    /// is extended so that at least one full poll window fits.
    pub fn normalized(self) -> Self {
        let poll_interval_ms = if self.poll_interval_ms <= 0 {
            DEFAULT_POLL_INTERVAL_MS
        } else {
            self.poll_interval_ms
        };

        let timeout_ms = if self.timeout_ms < poll_interval_ms {
            poll_interval_ms.saturating_add(TIMEOUT_GRACE_MS)
        } else {
            self.timeout_ms
        };

        Self {
            poll_interval_ms,
            timeout_ms,
        }
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unsigned_abs())
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unsigned_abs())
    }
}

impl<C> Client<C>
where
    C: HttpClient,
{
    /// Query the status of a task.
    ///
    /// A UPID without node yields an unsuccessful envelope without contacting the server.
    pub fn task_status(&self, upid: &str) -> ResponseEnvelope {
        let request = match upid_node(upid) {
            Some(node) => RequestDescriptor::get(format!("/nodes/{node}/tasks/{upid}/status")),
            None => {
                return ResponseEnvelope::from_error(
                    RequestDescriptor::get(format!("/nodes//tasks/{upid}/status")),
                    &anyhow::format_err!("invalid UPID {upid:?}, no node found"),
                )
            }
        };
        self.request(request)
    }

    /// Check once whether a task is still running.
    ///
    /// Only a `status` of `running` counts, a failed status query reports `false`.
    pub fn is_running(&self, upid: &str) -> bool {
        self.task_status(upid).data()["status"] == "running"
    }

    /// Poll a task until it stopped or the timeout expired.
    ///
    /// Returns `true` if the task finished in time.
    pub fn wait_until_finished(&self, upid: &str, options: WaitOptions) -> bool {
        let options = options.normalized();
        let timeout = options.timeout();
        let start = Instant::now();

        loop {
            if !self.is_running(upid) {
                return true;
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                log::debug!("task {upid} still running after {}ms", elapsed.as_millis());
                return false;
            }

            thread::sleep(options.poll_interval().min(timeout - elapsed));
        }
    }

    /// The exit status of a stopped task, `None` while it is running or if the status query
    /// failed.
    pub fn task_exit_status(&self, upid: &str) -> Option<String> {
        let status: TaskStatus = self.task_status(upid).data_as().ok()?;
        match status.status {
            IsRunning::Running => None,
            IsRunning::Stopped => status.exitstatus,
        }
    }

    /// Read lines of a task's log, `limit` lines starting at line `start`.
    pub fn task_log(&self, upid: &str, start: Option<u64>, limit: Option<u64>) -> ResponseEnvelope {
        let Some(node) = upid_node(upid) else {
            return ResponseEnvelope::from_error(
                RequestDescriptor::get(format!("/nodes//tasks/{upid}/log")),
                &anyhow::format_err!("invalid UPID {upid:?}, no node found"),
            );
        };

        let mut parameters = ParameterMap::new();
        parameters
            .maybe_insert("start", start)
            .maybe_insert("limit", limit);

        self.request(
            RequestDescriptor::get(format!("/nodes/{node}/tasks/{upid}/log"))
                .parameters(parameters),
        )
    }
}
