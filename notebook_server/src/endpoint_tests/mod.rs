mod helpers;
mod mocks;
mod status;
mod webhook;
mod worker;
