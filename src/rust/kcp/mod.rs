// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

mod acknowledger;
mod congestion_control;
mod ctrlblk;
pub mod header;
mod rto;
mod segment;
mod sequence_number;

#[cfg(test)]
mod tests;

pub use self::{
    ctrlblk::ControlBlock,
    header::{
        KcpCommand,
        KcpHeader,
    },
    sequence_number::{
        time_diff,
        SeqNumber,
    },
};
