//! Agent runtime - LLM-facing glue around the conversation engine.
//!
//! This crate sits between raw borrower text / model output and the
//! deterministic engine in `recova-core`:
//!
//! 1. **Signal extraction** (`conversation`) - parse borrower text into
//!    structured `BorrowerSignals` (opt-out, validation request, stated
//!    capacity, acceptance, distress)
//! 2. **Reply contract** (`llm`) - the `LlmClient` boundary trait and the
//!    structured JSON reply the model must produce
//! 3. **Reply gating** (`guardrails`) - strip model-proposed plans that fall
//!    outside configured negotiation policy
//! 4. **Turn assembly** (`runtime`) - build the prompt, run the model, and
//!    hand a complete `TurnInput` to the orchestrator
//!
//! # Safety Principle
//!
//! The LLM is strictly a translator. It never decides what may be offered,
//! what is compliant, or when to hand off - those are deterministic decisions
//! made by the core engine. A missing or malformed model reply degrades to a
//! low-confidence signal that routes the session toward escalation.

pub mod conversation;
pub mod guardrails;
pub mod llm;
pub mod runtime;
