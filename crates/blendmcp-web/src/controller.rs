//! Client half of the web form: the interpret-then-execute flow the page
//! runs, usable from the CLI or tests against any [`PageApi`].

use crate::server::{ErrorResponse, ExecuteRequest, InterpretRequest};
use blendmcp_connection::Response as BlenderResponse;
use blendmcp_interpret::{Interpretation, STATUS_SUCCESS};
use reqwest::blocking::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("Please enter a command.")]
    EmptyCommand,
    #[error("There is no generated code to execute.")]
    NothingToExecute,
    #[error("{detail}")]
    Http { status: u16, detail: String },
    #[error("Error communicating with the server: {0}")]
    Network(String),
}

/// The two endpoints the page talks to.
pub trait PageApi {
    fn interpret(&self, command: &str) -> Result<Interpretation, ControllerError>;
    fn execute(&self, code: &str) -> Result<BlenderResponse, ControllerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Reviewing,
    Executed,
}

/// What the page currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageView {
    pub review: Option<String>,
    pub generated_code: Option<String>,
    pub execute_enabled: bool,
    pub execution: Option<String>,
    pub error: Option<String>,
}

pub struct PageController<A: PageApi> {
    api: A,
    phase: Phase,
    view: PageView,
    last_code: Option<String>,
}

impl<A: PageApi> PageController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            phase: Phase::Idle,
            view: PageView::default(),
            last_code: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn view(&self) -> &PageView {
        &self.view
    }

    /// "Process" button. Empty input is rejected without a request.
    pub fn process(&mut self, text: &str) -> Result<(), ControllerError> {
        self.last_code = None;
        self.view = PageView::default();
        self.phase = Phase::Idle;

        let command = text.trim();
        if command.is_empty() {
            return Err(self.fail(ControllerError::EmptyCommand));
        }

        let interpretation = self.api.interpret(command).map_err(|err| self.fail(err))?;
        let executable = interpretation.status == STATUS_SUCCESS
            && !interpretation.generated_code.trim().is_empty();

        self.view.review = Some(interpretation.review);
        self.view.generated_code = Some(interpretation.generated_code.clone());
        self.view.execute_enabled = executable;
        if executable {
            self.last_code = Some(interpretation.generated_code);
        }
        self.phase = Phase::Reviewing;
        Ok(())
    }

    /// "Execute" button. Sends the last generated code.
    pub fn execute(&mut self) -> Result<(), ControllerError> {
        let Some(code) = self.last_code.clone() else {
            return Err(self.fail(ControllerError::NothingToExecute));
        };

        self.view.error = None;
        self.view.execution = None;
        let response = self.api.execute(&code).map_err(|err| self.fail(err))?;
        self.view.execution = Some(describe_execution(&response));
        self.phase = Phase::Executed;
        Ok(())
    }

    fn fail(&mut self, err: ControllerError) -> ControllerError {
        self.view.error = Some(err.to_string());
        if self.phase == Phase::Idle {
            self.view.execute_enabled = false;
        }
        err
    }
}

/// Text shown for an `execute` reply: status, then message, output, and
/// traceback when present.
pub fn describe_execution(response: &BlenderResponse) -> String {
    let mut lines = vec![format!("Status: {}", response.status)];
    if let Some(message) = response.message.as_deref().or(response.error.as_deref()) {
        lines.push(format!("Message: {message}"));
    }
    let output = response.output();
    if !output.is_empty() {
        lines.push(format!("Output:\n{output}"));
    }
    if let Some(traceback) = &response.traceback {
        lines.push(format!("Traceback:\n{traceback}"));
    }
    lines.join("\n")
}

/// [`PageApi`] over HTTP against a running web backend.
pub struct HttpPageApi {
    base_url: String,
    client: Client,
}

impl HttpPageApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ControllerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ControllerError::Network(err.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ControllerError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .map_err(|err| ControllerError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let fallback = status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string();
            let detail = response
                .json::<ErrorResponse>()
                .map(|body| body.detail)
                .unwrap_or(fallback);
            return Err(ControllerError::Http {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json()
            .map_err(|err| ControllerError::Network(err.to_string()))
    }
}

impl PageApi for HttpPageApi {
    fn interpret(&self, command: &str) -> Result<Interpretation, ControllerError> {
        self.post(
            "/api/blender/interpret",
            &InterpretRequest {
                natural_language_command: command.to_string(),
            },
        )
    }

    fn execute(&self, code: &str) -> Result<BlenderResponse, ControllerError> {
        self.post(
            "/api/blender/execute",
            &ExecuteRequest {
                code: code.to_string(),
            },
        )
    }
}
