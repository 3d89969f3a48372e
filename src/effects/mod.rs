pub mod modulation;
