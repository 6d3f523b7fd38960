quantity!(Pounds, suffix: "£", precision: 2);
