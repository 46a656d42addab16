pub mod catalog;
pub mod prober;
pub mod search_run;
pub mod waves;
