mod violations;
