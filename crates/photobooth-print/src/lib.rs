// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photobooth Print — OS printer discovery, the ordered print strategy chain,
// per-attempt spool files, and the client-side sequential print queue.  This
// crate bridges between the core domain types defined in `photobooth-core`
// and the host's print spooler.

pub mod discovery;
pub mod dispatcher;
pub mod last_job;
pub mod payload;
pub mod queue;
pub mod retry;
pub mod spool;
pub mod strategy;
pub mod test_page;

pub use discovery::{Classification, OsPrinterCatalog, PrinterCatalog};
pub use dispatcher::{DispatchSuccess, Dispatcher};
pub use last_job::LastJobCache;
pub use queue::{HttpPrintSubmitter, PrintQueue, PrintSubmitter, QueueRunner};
pub use retry::RetryPolicy;
pub use spool::{SpoolDir, SpoolFile};
pub use strategy::PrintStrategy;
