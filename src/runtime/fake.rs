//! Scripted [`ContainerRuntime`] for unit tests

use super::*;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&RunRequest) -> Result<ProcessOutput, HarnessError> + Send + Sync>;

/// Records every request and answers runs through a responder closure
pub struct FakeRuntime {
    responder: Responder,
    pub runs: Mutex<Vec<RunRequest>>,
    pub builds: Mutex<Vec<BuildRequest>>,
}

impl FakeRuntime {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&RunRequest) -> Result<ProcessOutput, HarnessError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            runs: Mutex::new(Vec::new()),
            builds: Mutex::new(Vec::new()),
        }
    }

    /// Every run succeeds with the given stdout
    pub fn answering(stdout: &str) -> Self {
        let stdout = stdout.to_string();
        Self::new(move |_| Ok(ProcessOutput::success(stdout.clone())))
    }

    pub fn runs(&self) -> Vec<RunRequest> {
        self.runs.lock().unwrap().clone()
    }

    pub fn builds(&self) -> Vec<BuildRequest> {
        self.builds.lock().unwrap().clone()
    }
}

pub fn failed(code: i32, stderr: &str) -> HarnessError {
    HarnessError::CommandFailed {
        command: "docker run".to_string(),
        exit_code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn run(&self, request: RunRequest) -> Result<ProcessOutput, HarnessError> {
        let result = (self.responder)(&request);
        self.runs.lock().unwrap().push(request);
        result
    }

    async fn build(&self, request: BuildRequest) -> Result<ProcessOutput, HarnessError> {
        self.builds.lock().unwrap().push(request);
        Ok(ProcessOutput::success(Vec::<u8>::new()))
    }
}
