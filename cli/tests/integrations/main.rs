mod bulk;
mod run;
