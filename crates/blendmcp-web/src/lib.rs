//! Web front end for the bridge: an axum backend that interprets free text
//! into Blender Python and forwards code to Blender, plus the page
//! controller that drives it.

pub mod controller;
mod server;

pub use controller::{
    ControllerError, HttpPageApi, PageApi, PageController, PageView, Phase, describe_execution,
};
pub use server::{
    ErrorResponse, ExecuteRequest, InterpretRequest, SharedInterpreter, SharedTransport, WebState,
    bridge_error_response, build_web_app, check_blender,
};
