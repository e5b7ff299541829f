// Module layout (Clean Architecture style)
// - bootstrap: configuration and startup wiring
// - infrastructure: relational and in-memory storage adapters
// - presentation: HTTP handlers, content negotiation and output formatters
// - application: DTOs, repository ports and document use cases
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
