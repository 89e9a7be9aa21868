// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

mod kcp;

//==============================================================================
// Exports
//==============================================================================

pub use self::kcp::KcpConfig;
