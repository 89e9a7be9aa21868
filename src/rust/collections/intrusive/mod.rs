// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

mod intrusive_list;

//==============================================================================
// Exports
//==============================================================================

pub use self::intrusive_list::{
    IntrusiveList,
    Iter,
    ListArena,
};
