pub mod flanger;
