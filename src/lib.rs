// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
//! # RustedIntegrals
//!
//! Symbolic integral calculator. A user-supplied single-variable expression is parsed
//! into a symbolic tree, integrated with a rule-based integrator, optionally evaluated
//! between two bounds, and sampled for plotting the function, its antiderivative and the
//! area under the curve. The same pipeline is served over HTTP by the `server` module.
//!
//! # Example
//! ```
//! use RustedIntegrals::integrator::engine::{EngineSettings, IntegrationEngine};
//! use RustedIntegrals::integrator::request::IntegrationRequest;
//! let engine = IntegrationEngine::new(EngineSettings::default());
//! let result = engine.run(&IntegrationRequest::new("x**2", "x", Some("0"), Some("2")));
//! assert!(result.success);
//! assert_eq!(result.integral_text.as_deref(), Some("x**3/3 + C"));
//! assert!((result.definite_value.unwrap() - 8.0 / 3.0).abs() < 1e-12);
//! ```
pub mod Utils;
pub mod errors;
pub mod integrator;
pub mod server;
pub mod symbolic;
