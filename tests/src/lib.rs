//! End-to-end scenarios for the sweep engine. Tests only; nothing is exported.

#[cfg(test)]
mod network;
#[cfg(test)]
mod scenarios;
