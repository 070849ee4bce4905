mod dependencies;
mod invoke;
mod options;
