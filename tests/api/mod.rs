mod harness;

mod authz;
mod scoping;
