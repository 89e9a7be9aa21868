// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use ::flexi_logger::Logger;
use ::std::sync::Once;

//==============================================================================
// Static Variables
//==============================================================================

/// Guardian to the logging initialize function.
static INIT_LOG: Once = Once::new();

//==============================================================================
// Standalone Functions
//==============================================================================

/// Initializes logging features. The log specification is taken from the `RUST_LOG` environment variable, and
/// logging stays off when it is not set.
pub fn initialize() {
    INIT_LOG.call_once(|| {
        if let Err(e) = Logger::try_with_env_or_str("off").and_then(|logger| logger.start()) {
            eprintln!("initialize(): failed to start logger (error={:?})", e);
        }
    });
}
