mod support;

mod batch;
mod prompts;
mod scenarios;
mod validator;
mod what_if;
