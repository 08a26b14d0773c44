// SPDX-License-Identifier: MIT
pub mod log;
pub mod string;
